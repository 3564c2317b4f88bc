//! Adaptive reading-comprehension engine
//!
//! Pure state management: sections move through their question lifecycle,
//! first attempts feed per-skill statistics, and the statistics drive both the
//! skills requested for the next question and the difficulty suggested for
//! the next passage. Question, grading and passage generation are external
//! collaborators described in [`collaborator`].

pub mod collaborator;
pub mod difficulty;
pub mod error;
pub mod passage;
pub mod prioritizer;
pub mod section;
pub mod session;
pub mod skill;
pub mod stats;

pub use collaborator::{
    AnswerGrader, GeneratedQuestion, Grading, GradingRequest, PassageGenerator, PassageRequest,
    QuestionGenerator, QuestionRequest, Tutor,
};
pub use difficulty::DifficultyRecommender;
pub use error::{QuizError, ValidationError};
pub use passage::Passage;
pub use prioritizer::SkillPrioritizer;
pub use section::{GradeReport, SectionFlowController, SectionIndex, SectionPhase, SectionScored};
pub use session::{
    CachedAnswer, CachedQuestion, CompletionTicket, Delivery, GradingApplied, PendingGrading,
    RequestTag, ScoreBand, SectionPrompt, SessionController, SessionState, SessionSummary,
};
pub use skill::{ComprehensionSkill, DifficultyTier};
pub use stats::{AnsweredQuestion, SkillStatistics, SkillTally};
