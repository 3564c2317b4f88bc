//! Difficulty recommendation for the next passage

use super::error::ValidationError;
use super::skill::DifficultyTier;

/// Maps an overall first-attempt percentage to a difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyRecommender {
    /// Rounded percentage at or above which `Advanced` is recommended
    pub advanced_at: u8,
    /// Rounded percentage at or above which `Intermediate` is recommended
    pub intermediate_at: u8,
}

impl Default for DifficultyRecommender {
    fn default() -> Self {
        Self { advanced_at: Self::ADVANCED_AT, intermediate_at: Self::INTERMEDIATE_AT }
    }
}

impl DifficultyRecommender {
    pub const ADVANCED_AT: u8 = 90;
    pub const INTERMEDIATE_AT: u8 = 70;

    pub fn new(advanced_at: u8, intermediate_at: u8) -> Self {
        Self { advanced_at, intermediate_at }
    }

    /// Rounded percentage of `correct` out of `total`
    pub fn percentage(correct: usize, total: usize) -> Result<u8, ValidationError> {
        if total == 0 {
            return Err(ValidationError::NoCompletedSections);
        }
        if correct > total {
            return Err(ValidationError::CountExceedsTotal { correct, total });
        }
        Ok((100.0 * correct as f64 / total as f64).round() as u8)
    }

    /// Recommend a tier for the next passage
    ///
    /// Fails when `total` is zero; the caller falls back to its own default.
    pub fn recommend(&self, correct: usize, total: usize) -> Result<DifficultyTier, ValidationError> {
        let pct = Self::percentage(correct, total)?;

        Ok(if pct >= self.advanced_at {
            DifficultyTier::Advanced
        } else if pct >= self.intermediate_at {
            DifficultyTier::Intermediate
        } else {
            DifficultyTier::Beginner
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommend_bands() {
        let recommender = DifficultyRecommender::default();
        assert_eq!(recommender.recommend(9, 10), Ok(DifficultyTier::Advanced));
        assert_eq!(recommender.recommend(7, 10), Ok(DifficultyTier::Intermediate));
        assert_eq!(recommender.recommend(6, 10), Ok(DifficultyTier::Beginner));
        assert_eq!(recommender.recommend(0, 3), Ok(DifficultyTier::Beginner));
    }

    #[test]
    fn recommend_uses_rounded_percentage() {
        // 2/3 = 66.67 -> 67, still beginner; 13/15 = 86.67 -> 87
        let recommender = DifficultyRecommender::default();
        assert_eq!(recommender.recommend(2, 3), Ok(DifficultyTier::Beginner));
        assert_eq!(recommender.recommend(13, 15), Ok(DifficultyTier::Intermediate));
        // 179/200 = 89.5 rounds up
        assert_eq!(recommender.recommend(179, 200), Ok(DifficultyTier::Advanced));
    }

    #[test]
    fn recommend_without_completed_sections_fails() {
        let result = DifficultyRecommender::default().recommend(0, 0);
        assert_eq!(result, Err(ValidationError::NoCompletedSections));
    }

    #[test]
    fn recommend_rejects_impossible_counts() {
        let result = DifficultyRecommender::default().recommend(4, 3);
        assert!(matches!(result, Err(ValidationError::CountExceedsTotal { .. })));
    }

    #[test]
    fn bands_are_configurable() {
        let lenient = DifficultyRecommender::new(80, 50);
        assert_eq!(lenient.recommend(4, 5), Ok(DifficultyTier::Advanced));
        assert_eq!(lenient.recommend(3, 5), Ok(DifficultyTier::Intermediate));
    }
}
