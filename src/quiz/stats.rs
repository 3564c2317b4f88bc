//! Per-skill performance tallies

use serde::{Deserialize, Serialize};

use super::section::SectionIndex;
use super::skill::ComprehensionSkill;

/// First grading outcome of a section, recorded once per passage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    /// Section the question belongs to
    pub section: SectionIndex,
    /// Answer text of the first graded submission
    pub answer: String,
    /// Skill the question tested
    pub skill: ComprehensionSkill,
    /// Whether that first submission was graded correct
    pub correct_on_first_attempt: bool,
}

/// Tested/correct counts for one skill
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTally {
    pub tested: usize,
    pub correct: usize,
}

impl SkillTally {
    /// Fraction answered correctly, `None` if never tested
    pub fn ratio(&self) -> Option<f64> {
        (self.tested > 0).then(|| self.correct as f64 / self.tested as f64)
    }
}

/// Tallies for all three skills
///
/// Always derived from the answered-question log, never stored on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillStatistics {
    #[serde(rename = "Understanding")]
    pub understanding: SkillTally,
    #[serde(rename = "Reasoning")]
    pub reasoning: SkillTally,
    #[serde(rename = "Application")]
    pub application: SkillTally,
}

impl SkillStatistics {
    /// Fold a log of answered questions into per-skill tallies
    pub fn compute<'a, I>(log: I) -> Self
    where
        I: IntoIterator<Item = &'a AnsweredQuestion>,
    {
        log.into_iter().fold(Self::default(), |mut stats, answered| {
            let tally = stats.get_mut(answered.skill);
            tally.tested += 1;
            if answered.correct_on_first_attempt {
                tally.correct += 1;
            }
            stats
        })
    }

    pub fn get(&self, skill: ComprehensionSkill) -> SkillTally {
        match skill {
            ComprehensionSkill::Understanding => self.understanding,
            ComprehensionSkill::Reasoning => self.reasoning,
            ComprehensionSkill::Application => self.application,
        }
    }

    fn get_mut(&mut self, skill: ComprehensionSkill) -> &mut SkillTally {
        match skill {
            ComprehensionSkill::Understanding => &mut self.understanding,
            ComprehensionSkill::Reasoning => &mut self.reasoning,
            ComprehensionSkill::Application => &mut self.application,
        }
    }

    /// Skills with their tallies, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (ComprehensionSkill, SkillTally)> + '_ {
        ComprehensionSkill::ALL.into_iter().map(|skill| (skill, self.get(skill)))
    }

    /// Total number of answered questions across skills
    pub fn total_tested(&self) -> usize {
        self.iter().map(|(_, tally)| tally.tested).sum()
    }

    pub fn total_correct(&self) -> usize {
        self.iter().map(|(_, tally)| tally.correct).sum()
    }

    /// True if no question has been answered yet
    pub fn is_empty(&self) -> bool {
        self.total_tested() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn answered(section: usize, skill: ComprehensionSkill, correct: bool) -> AnsweredQuestion {
        AnsweredQuestion {
            section,
            answer: format!("answer {}", section),
            skill,
            correct_on_first_attempt: correct,
        }
    }

    #[test]
    fn empty_log_yields_zero_statistics() {
        let stats = SkillStatistics::compute(&Vec::<AnsweredQuestion>::new());
        assert_eq!(stats, SkillStatistics::default());
        assert!(stats.is_empty());
    }

    #[test]
    fn counts_tested_and_correct_per_skill() {
        let log = vec![
            answered(0, ComprehensionSkill::Understanding, true),
            answered(1, ComprehensionSkill::Reasoning, false),
            answered(2, ComprehensionSkill::Reasoning, true),
            answered(3, ComprehensionSkill::Understanding, true),
        ];

        let stats = SkillStatistics::compute(&log);
        assert_eq!(stats.understanding, SkillTally { tested: 2, correct: 2 });
        assert_eq!(stats.reasoning, SkillTally { tested: 2, correct: 1 });
        assert_eq!(stats.application, SkillTally::default());
        assert_eq!(stats.total_correct(), 3);
    }

    #[test]
    fn ratio_is_none_when_untested() {
        assert_eq!(SkillTally::default().ratio(), None);
        assert_eq!(SkillTally { tested: 4, correct: 1 }.ratio(), Some(0.25));
    }

    #[test]
    fn serializes_with_skill_names() {
        let json = serde_json::to_value(SkillStatistics::default()).unwrap();
        assert_eq!(json["Reasoning"]["tested"], 0);
        assert_eq!(json["Application"]["correct"], 0);
    }

    fn arb_log() -> impl Strategy<Value = Vec<AnsweredQuestion>> {
        prop::collection::vec((0usize..3, any::<bool>()), 0..40).prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (skill, correct))| {
                    answered(i, ComprehensionSkill::ALL[skill], correct)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn tested_sums_to_log_length(log in arb_log()) {
            let stats = SkillStatistics::compute(&log);
            prop_assert_eq!(stats.total_tested(), log.len());
            for (_, tally) in stats.iter() {
                prop_assert!(tally.correct <= tally.tested);
            }
        }

        #[test]
        fn order_does_not_matter(log in arb_log()) {
            let mut reversed = log.clone();
            reversed.reverse();
            prop_assert_eq!(SkillStatistics::compute(&log), SkillStatistics::compute(&reversed));
        }
    }
}
