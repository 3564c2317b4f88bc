//! Question lifecycle for a single section
//!
//! ```text
//! AwaitingQuestion --question--> Ready --submit--> Submitting --graded--> Evaluated
//!        |  ^                      ^                    |                  |
//!   fail |  | regenerate           +---- grading fail --+                  |
//!        v  |                      +------------- try again (incorrect) ---+
//!      Errored
//! ```
//!
//! Every outstanding request carries a sequence number. Results whose number
//! is no longer the one in flight are ignored.

use tracing::debug;

use super::collaborator::{GeneratedQuestion, Grading};
use super::error::ValidationError;
use super::session::CachedAnswer;
use super::skill::ComprehensionSkill;

/// Position of a section within the current passage
pub type SectionIndex = usize;

/// Phase of a section's question lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPhase {
    /// No question yet; a generation request may be in flight
    AwaitingQuestion,
    /// Generation failed; a new generation request may be issued
    Errored,
    /// Question shown, accepting an answer
    Ready,
    /// Answer sent for grading
    Submitting,
    /// Answer graded
    Evaluated,
}

impl SectionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingQuestion => "awaiting a question",
            Self::Errored => "errored",
            Self::Ready => "ready",
            Self::Submitting => "submitting",
            Self::Evaluated => "evaluated",
        }
    }
}

/// Emitted once per section, on its first grading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionScored {
    pub section: SectionIndex,
    pub correct_on_first_attempt: bool,
}

/// Result of a grading applied to a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeReport {
    pub section: SectionIndex,
    pub answer: String,
    pub grading: Grading,
    pub skill: ComprehensionSkill,
    /// Present only for the section's first grading
    pub scored: Option<SectionScored>,
}

/// State machine for one section
#[derive(Debug, Clone)]
pub struct SectionFlowController {
    index: SectionIndex,
    phase: SectionPhase,
    question: Option<GeneratedQuestion>,
    /// Draft or submitted answer text
    answer: String,
    grading: Option<Grading>,
    error: Option<String>,
    first_attempt_consumed: bool,
    seq: u64,
    in_flight: Option<u64>,
}

impl SectionFlowController {
    pub fn new(index: SectionIndex) -> Self {
        Self {
            index,
            phase: SectionPhase::AwaitingQuestion,
            question: None,
            answer: String::new(),
            grading: None,
            error: None,
            first_attempt_consumed: false,
            seq: 0,
            in_flight: None,
        }
    }

    pub fn index(&self) -> SectionIndex {
        self.index
    }

    pub fn phase(&self) -> SectionPhase {
        self.phase
    }

    pub fn question(&self) -> Option<&GeneratedQuestion> {
        self.question.as_ref()
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Most recent grading, if the section is evaluated
    pub fn grading(&self) -> Option<&Grading> {
        self.grading.as_ref()
    }

    /// Last surfaced error message
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn first_attempt_consumed(&self) -> bool {
        self.first_attempt_consumed
    }

    /// Sequence number of the outstanding request, if any
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn can_submit(&self) -> bool {
        self.phase == SectionPhase::Ready
    }

    /// Try again is offered only after an incorrect grading
    pub fn can_retry(&self) -> bool {
        self.phase == SectionPhase::Evaluated && self.grading.as_ref().is_some_and(|g| !g.correct)
    }

    /// Section is done for input purposes
    pub fn is_settled(&self) -> bool {
        self.phase == SectionPhase::Evaluated && self.grading.as_ref().is_some_and(|g| g.correct)
    }

    /// Start (or restart) question generation, returning the request's sequence number
    ///
    /// Calling this while a request is already outstanding supersedes it.
    pub fn begin_generation(&mut self) -> Result<u64, ValidationError> {
        match self.phase {
            SectionPhase::AwaitingQuestion | SectionPhase::Errored => {}
            other => {
                return Err(ValidationError::NotReady {
                    action: "request a question",
                    phase: other.name(),
                });
            }
        }

        self.seq += 1;
        self.in_flight = Some(self.seq);
        self.phase = SectionPhase::AwaitingQuestion;
        self.error = None;
        debug!(section = self.index, seq = self.seq, "question requested");
        Ok(self.seq)
    }

    /// Show a question. With a cached answer the section goes straight to
    /// `Evaluated`, restoring the answer and its grading.
    pub fn present(
        &mut self,
        question: GeneratedQuestion,
        cached: Option<&CachedAnswer>,
    ) -> Result<(), ValidationError> {
        match self.phase {
            SectionPhase::AwaitingQuestion | SectionPhase::Errored => {}
            other => {
                return Err(ValidationError::NotReady {
                    action: "present a question",
                    phase: other.name(),
                });
            }
        }

        self.in_flight = None;
        self.error = None;
        self.question = Some(question);

        match cached {
            Some(cached) => {
                self.answer = cached.answer.clone();
                self.grading = Some(cached.grading.clone());
                self.first_attempt_consumed = true;
                self.phase = SectionPhase::Evaluated;
            }
            None => {
                self.answer.clear();
                self.grading = None;
                self.phase = SectionPhase::Ready;
            }
        }
        debug!(section = self.index, phase = self.phase.name(), "question presented");
        Ok(())
    }

    /// Apply a generated question. Returns false if `seq` is stale.
    pub fn question_generated(
        &mut self,
        seq: u64,
        question: GeneratedQuestion,
        cached: Option<&CachedAnswer>,
    ) -> bool {
        if !self.is_current(seq) || self.phase != SectionPhase::AwaitingQuestion {
            return false;
        }
        self.present(question, cached).is_ok()
    }

    /// Record a failed generation. Returns false if `seq` is stale.
    pub fn question_failed(&mut self, seq: u64, message: impl Into<String>) -> bool {
        if !self.is_current(seq) || self.phase != SectionPhase::AwaitingQuestion {
            return false;
        }
        self.in_flight = None;
        self.phase = SectionPhase::Errored;
        self.error = Some(message.into());
        true
    }

    /// Submit an answer for grading, returning the request's sequence number
    pub fn submit(&mut self, text: &str) -> Result<u64, ValidationError> {
        match self.phase {
            SectionPhase::Ready => {}
            SectionPhase::AwaitingQuestion | SectionPhase::Errored => {
                return Err(ValidationError::NoQuestion);
            }
            other => {
                return Err(ValidationError::NotReady {
                    action: "submit an answer",
                    phase: other.name(),
                });
            }
        }
        if self.question.is_none() {
            return Err(ValidationError::NoQuestion);
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyAnswer);
        }

        self.answer = text.to_string();
        self.error = None;
        self.seq += 1;
        self.in_flight = Some(self.seq);
        self.phase = SectionPhase::Submitting;
        debug!(section = self.index, seq = self.seq, "answer submitted");
        Ok(self.seq)
    }

    /// Apply a grading. Returns `None` if `seq` is stale.
    ///
    /// The report carries `SectionScored` only for the first grading this
    /// section ever receives.
    pub fn graded(&mut self, seq: u64, grading: Grading) -> Option<GradeReport> {
        if !self.is_current(seq) || self.phase != SectionPhase::Submitting {
            return None;
        }
        let skill = self.question.as_ref()?.skill;

        self.in_flight = None;
        self.phase = SectionPhase::Evaluated;
        self.grading = Some(grading.clone());

        let scored = if self.first_attempt_consumed {
            None
        } else {
            self.first_attempt_consumed = true;
            Some(SectionScored { section: self.index, correct_on_first_attempt: grading.correct })
        };

        debug!(section = self.index, correct = grading.correct, first = scored.is_some(), "graded");
        Some(GradeReport { section: self.index, answer: self.answer.clone(), grading, skill, scored })
    }

    /// Record a failed grading; the answer text is kept. Returns false if `seq` is stale.
    pub fn grading_failed(&mut self, seq: u64, message: impl Into<String>) -> bool {
        if !self.is_current(seq) || self.phase != SectionPhase::Submitting {
            return false;
        }
        self.in_flight = None;
        self.phase = SectionPhase::Ready;
        self.error = Some(message.into());
        true
    }

    /// Go back to answering after an incorrect grading
    pub fn try_again(&mut self) -> Result<(), ValidationError> {
        if self.phase != SectionPhase::Evaluated {
            return Err(ValidationError::NotReady { action: "try again", phase: self.phase.name() });
        }
        if self.is_settled() {
            return Err(ValidationError::RetryUnavailable);
        }

        self.answer.clear();
        self.grading = None;
        self.error = None;
        self.phase = SectionPhase::Ready;
        Ok(())
    }

    fn is_current(&self, seq: u64) -> bool {
        self.in_flight == Some(seq)
    }
}
