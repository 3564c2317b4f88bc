//! Chooses which skills the next question should focus on

use super::skill::ComprehensionSkill;
use super::stats::SkillStatistics;

/// Orders skills for the question generator: untested first, then weak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillPrioritizer {
    /// A tested skill below this first-attempt ratio counts as weak
    pub weakness_threshold: f64,
}

impl Default for SkillPrioritizer {
    fn default() -> Self {
        Self { weakness_threshold: Self::WEAKNESS_THRESHOLD }
    }
}

impl SkillPrioritizer {
    pub const WEAKNESS_THRESHOLD: f64 = 0.70;

    pub fn new(weakness_threshold: f64) -> Self {
        Self { weakness_threshold }
    }

    /// Skills to prefer for the next question.
    ///
    /// Empty when nothing has been answered yet, meaning the generator may
    /// choose freely. Otherwise never-tested skills come first, followed by
    /// tested skills whose ratio is below the threshold, each group in
    /// declaration order. Skills that are neither are left out.
    pub fn prioritize(&self, stats: &SkillStatistics) -> Vec<ComprehensionSkill> {
        if stats.is_empty() {
            return Vec::new();
        }

        let mut skills: Vec<_> =
            stats.iter().filter(|(_, tally)| tally.tested == 0).map(|(skill, _)| skill).collect();
        skills.extend(self.weak_skills(stats));
        skills
    }

    /// Tested skills below the threshold
    pub fn weak_skills(&self, stats: &SkillStatistics) -> Vec<ComprehensionSkill> {
        stats
            .iter()
            .filter(|(_, tally)| tally.ratio().is_some_and(|r| r < self.weakness_threshold))
            .map(|(skill, _)| skill)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::stats::SkillTally;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use ComprehensionSkill::*;

    #[test]
    fn no_answers_means_no_preference() {
        let prioritizer = SkillPrioritizer::default();
        assert!(prioritizer.prioritize(&SkillStatistics::default()).is_empty());
    }

    #[test]
    fn untested_first_then_weak() {
        let stats = SkillStatistics {
            understanding: SkillTally { tested: 0, correct: 0 },
            reasoning: SkillTally { tested: 3, correct: 3 },
            application: SkillTally { tested: 2, correct: 0 },
        };

        assert_eq!(SkillPrioritizer::default().prioritize(&stats), vec![Understanding, Application]);
    }

    #[test]
    fn exactly_at_threshold_is_not_weak() {
        let stats = SkillStatistics {
            understanding: SkillTally { tested: 10, correct: 7 },
            reasoning: SkillTally { tested: 10, correct: 6 },
            application: SkillTally { tested: 1, correct: 1 },
        };

        assert_eq!(SkillPrioritizer::default().prioritize(&stats), vec![Reasoning]);
    }

    #[test]
    fn threshold_is_configurable() {
        let stats = SkillStatistics {
            understanding: SkillTally { tested: 4, correct: 3 },
            reasoning: SkillTally { tested: 4, correct: 4 },
            application: SkillTally { tested: 4, correct: 2 },
        };

        let strict = SkillPrioritizer::new(0.8);
        assert_eq!(strict.prioritize(&stats), vec![Understanding, Application]);
        assert_eq!(SkillPrioritizer::new(0.5).prioritize(&stats), Vec::new());
    }

    proptest! {
        #[test]
        fn each_skill_appears_at_most_once(
            counts in prop::array::uniform3((0usize..6, 0usize..6))
        ) {
            let tally = |(tested, correct): (usize, usize)| SkillTally {
                tested,
                correct: correct.min(tested),
            };
            let stats = SkillStatistics {
                understanding: tally(counts[0]),
                reasoning: tally(counts[1]),
                application: tally(counts[2]),
            };

            let skills = SkillPrioritizer::default().prioritize(&stats);
            for skill in ComprehensionSkill::ALL {
                prop_assert!(skills.iter().filter(|s| **s == skill).count() <= 1);
            }
        }
    }
}
