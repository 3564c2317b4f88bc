//! Error types for the quiz engine

use thiserror::Error;

use super::section::SectionIndex;

/// Errors surfaced by the quiz engine and its collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// Question or passage generation failed or returned an incomplete result
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Answer evaluation failed or returned an incomplete result
    #[error("Grading failed: {0}")]
    Grading(String),

    /// A precondition was violated; nothing was changed
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl QuizError {
    /// Check if the learner can retry the operation that produced this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QuizError::Generation(_) | QuizError::Grading(_))
    }

    /// Message suitable for showing to the learner
    pub fn user_message(&self) -> String {
        match self {
            QuizError::Generation(_) => "Unable to generate content. Please try again.".to_string(),
            QuizError::Grading(_) => "Unable to evaluate answer. Please try again.".to_string(),
            QuizError::Validation(e) => e.to_string(),
        }
    }
}

/// Rejected preconditions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Section {index} does not exist (passage has {total} sections)")]
    SectionOutOfRange { index: SectionIndex, total: usize },

    #[error("Answer is empty")]
    EmptyAnswer,

    #[error("No question is available for this section yet")]
    NoQuestion,

    /// Operation not valid in the section's current phase
    #[error("Cannot {action} while the section is {phase}")]
    NotReady { action: &'static str, phase: &'static str },

    #[error("The answer was correct; there is nothing to retry")]
    RetryUnavailable,

    #[error("No sections have been completed yet")]
    NoCompletedSections,

    #[error("Correct count {correct} exceeds total {total}")]
    CountExceedsTotal { correct: usize, total: usize },

    #[error("Passage has no sections")]
    EmptyPassage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_failures_are_recoverable() {
        assert!(QuizError::Generation("timeout".into()).is_recoverable());
        assert!(QuizError::Grading("bad json".into()).is_recoverable());
        assert!(!QuizError::from(ValidationError::EmptyAnswer).is_recoverable());
    }

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = QuizError::from(ValidationError::SectionOutOfRange { index: 7, total: 5 });
        assert_eq!(err.user_message(), "Section 7 does not exist (passage has 5 sections)");
    }
}
