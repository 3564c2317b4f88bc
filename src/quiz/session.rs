//! Passage-level orchestration
//!
//! `SessionController` owns one `SectionFlowController` per section plus all
//! bookkeeping for the current passage. Collaborator calls happen outside:
//! the controller hands out tagged requests and accepts their results later,
//! discarding any that belong to a superseded request or an earlier passage.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::collaborator::{
    GeneratedQuestion, Grading, GradingRequest, PassageGenerator, PassageRequest, QuestionRequest,
};
use super::difficulty::DifficultyRecommender;
use super::error::{QuizError, ValidationError};
use super::passage::Passage;
use super::prioritizer::SkillPrioritizer;
use super::section::{GradeReport, SectionFlowController, SectionIndex, SectionPhase};
use super::skill::{ComprehensionSkill, DifficultyTier};
use super::stats::{AnsweredQuestion, SkillStatistics};

/// Identifies an outstanding collaborator request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag {
    /// Passage epoch the request was issued for
    pub passage: u64,
    pub section: SectionIndex,
    /// Section-local sequence number
    pub seq: u64,
}

/// Permission to mark a passage complete once the presentation delay passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionTicket {
    passage: u64,
}

/// Whether a collaborator result was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery<T> {
    Applied(T),
    /// The request was superseded; nothing changed
    Stale,
}

impl<T> Delivery<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Delivery::Stale)
    }
}

/// Question generated for a section in the current passage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedQuestion {
    pub question: String,
    pub skill: ComprehensionSkill,
}

/// Most recent graded submission for a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedAnswer {
    pub answer: String,
    pub grading: Grading,
    pub skill: ComprehensionSkill,
}

/// What the host must do to show a section's question
#[derive(Debug, Clone, PartialEq)]
pub enum SectionPrompt {
    /// The section already has its question
    Present,
    /// Call the question generator and pass the result to `accept_question`
    Generate { tag: RequestTag, request: QuestionRequest },
}

/// A submission waiting for the grader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGrading {
    pub tag: RequestTag,
    pub request: GradingRequest,
}

/// A grading that was applied to its section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingApplied {
    pub report: GradeReport,
    /// Set when this grading finished the passage
    pub completion: Option<CompletionTicket>,
}

/// Encouragement band for a finished passage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreBand {
    Perfect,
    Great,
    Good,
    KeepPracticing,
}

impl ScoreBand {
    pub fn from_percentage(pct: u8) -> Self {
        match pct {
            100.. => Self::Perfect,
            80..=99 => Self::Great,
            60..=79 => Self::Good,
            _ => Self::KeepPracticing,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Perfect => "Perfect score! You have excellent comprehension skills!",
            Self::Great => "Great work! You understood the passage very well!",
            Self::Good => "Good job! Keep practicing to improve further!",
            Self::KeepPracticing => "Nice effort! Try reading more carefully next time!",
        }
    }
}

/// Score overview for the current passage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub correct: usize,
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
    pub band: ScoreBand,
}

/// All state for the passage being read
#[derive(Debug, Clone)]
pub struct SessionState {
    passage: Passage,
    epoch: u64,
    answered: Vec<AnsweredQuestion>,
    cached_questions: HashMap<SectionIndex, CachedQuestion>,
    cached_answers: HashMap<SectionIndex, CachedAnswer>,
    completed: BTreeSet<SectionIndex>,
    /// First-attempt outcome per completed section
    correctness: BTreeMap<SectionIndex, bool>,
    correct_answers: usize,
    complete: bool,
}

impl SessionState {
    fn new(passage: Passage, epoch: u64) -> Self {
        Self {
            passage,
            epoch,
            answered: Vec::new(),
            cached_questions: HashMap::new(),
            cached_answers: HashMap::new(),
            completed: BTreeSet::new(),
            correctness: BTreeMap::new(),
            correct_answers: 0,
            complete: false,
        }
    }

    pub fn passage(&self) -> &Passage {
        &self.passage
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// First-grading log, in the order sections were first graded
    pub fn answered_questions(&self) -> &[AnsweredQuestion] {
        &self.answered
    }

    pub fn completed_sections(&self) -> &BTreeSet<SectionIndex> {
        &self.completed
    }

    pub fn correct_answers(&self) -> usize {
        self.correct_answers
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Drives all sections of one passage at a time
#[derive(Debug, Clone)]
pub struct SessionController {
    state: SessionState,
    sections: Vec<SectionFlowController>,
    prioritizer: SkillPrioritizer,
    recommender: DifficultyRecommender,
    epochs: u64,
}

impl SessionController {
    /// Start a session on the given passage
    pub fn new(passage: Passage) -> Result<Self, ValidationError> {
        let mut controller = Self {
            state: SessionState::new(Passage::new("", Vec::new()), 0),
            sections: Vec::new(),
            prioritizer: SkillPrioritizer::default(),
            recommender: DifficultyRecommender::default(),
            epochs: 0,
        };
        controller.load_passage(passage)?;
        Ok(controller)
    }

    pub fn with_prioritizer(mut self, prioritizer: SkillPrioritizer) -> Self {
        self.prioritizer = prioritizer;
        self
    }

    pub fn with_recommender(mut self, recommender: DifficultyRecommender) -> Self {
        self.recommender = recommender;
        self
    }

    /// Replace the passage and reset every piece of session state
    pub fn load_passage(&mut self, passage: Passage) -> Result<(), ValidationError> {
        if passage.section_count() == 0 {
            return Err(ValidationError::EmptyPassage);
        }

        self.epochs += 1;
        self.sections = (0..passage.section_count()).map(SectionFlowController::new).collect();
        info!(
            title = %passage.title,
            sections = passage.section_count(),
            epoch = self.epochs,
            "passage loaded"
        );
        self.state = SessionState::new(passage, self.epochs);
        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn passage(&self) -> &Passage {
        &self.state.passage
    }

    pub fn total_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn section(&self, index: SectionIndex) -> Option<&SectionFlowController> {
        self.sections.get(index)
    }

    pub fn completed_sections(&self) -> usize {
        self.state.completed.len()
    }

    pub fn is_completed(&self, index: SectionIndex) -> bool {
        self.state.completed.contains(&index)
    }

    pub fn correct_answers(&self) -> usize {
        self.state.correct_answers
    }

    pub fn is_complete(&self) -> bool {
        self.state.complete
    }

    pub fn cached_question(&self, index: SectionIndex) -> Option<&CachedQuestion> {
        self.state.cached_questions.get(&index)
    }

    pub fn cached_answer(&self, index: SectionIndex) -> Option<&CachedAnswer> {
        self.state.cached_answers.get(&index)
    }

    /// First-attempt correctness of a completed section
    pub fn section_correctness(&self, index: SectionIndex) -> Option<bool> {
        self.state.correctness.get(&index).copied()
    }

    pub fn skill_statistics(&self) -> SkillStatistics {
        SkillStatistics::compute(&self.state.answered)
    }

    /// Skills the next question should favour
    pub fn prioritized_skills(&self) -> Vec<ComprehensionSkill> {
        self.prioritizer.prioritize(&self.skill_statistics())
    }

    /// Recommended tier for the next passage, based on completed sections
    pub fn recommended_tier(&self) -> Result<DifficultyTier, ValidationError> {
        self.recommender.recommend(self.state.correct_answers, self.state.completed.len())
    }

    /// Recommended tier, or `default` when nothing has been completed
    pub fn next_tier_or(&self, default: DifficultyTier) -> DifficultyTier {
        self.recommended_tier().unwrap_or(default)
    }

    pub fn summary(&self) -> SessionSummary {
        let total = self.total_sections();
        let correct = self.state.correct_answers;
        let percentage = DifficultyRecommender::percentage(correct, total).unwrap_or(0);
        SessionSummary {
            correct,
            completed: self.completed_sections(),
            total,
            percentage,
            band: ScoreBand::from_percentage(percentage),
        }
    }

    /// Make sure a section has its question
    ///
    /// Uses the cached question (and cached answer) when one exists; otherwise
    /// issues a generation request. Repeating this for a section whose
    /// request is still outstanding supersedes that request.
    pub fn prepare_section(&mut self, index: SectionIndex) -> Result<SectionPrompt, QuizError> {
        self.check_index(index)?;
        let phase = self.sections[index].phase();
        if !matches!(phase, SectionPhase::AwaitingQuestion | SectionPhase::Errored) {
            return Ok(SectionPrompt::Present);
        }

        if let Some(cached) = self.state.cached_questions.get(&index) {
            let question = GeneratedQuestion::new(cached.question.clone(), cached.skill);
            let answer = self.state.cached_answers.get(&index);
            self.sections[index].present(question, answer)?;
            debug!(section = index, "question restored from cache");
            return Ok(SectionPrompt::Present);
        }

        let request = self.question_request(index);
        let seq = self.sections[index].begin_generation()?;
        let tag = RequestTag { passage: self.state.epoch, section: index, seq };
        Ok(SectionPrompt::Generate { tag, request })
    }

    /// Manually retry a failed question generation
    pub fn retry_generation(&mut self, index: SectionIndex) -> Result<SectionPrompt, QuizError> {
        self.check_index(index)?;
        let phase = self.sections[index].phase();
        if phase != SectionPhase::Errored {
            return Err(ValidationError::NotReady {
                action: "retry question generation",
                phase: phase.name(),
            }
            .into());
        }
        self.prepare_section(index)
    }

    /// Record a generated question in the cache
    pub fn on_question_generated(
        &mut self,
        index: SectionIndex,
        question: &str,
        skill: ComprehensionSkill,
    ) -> Result<(), ValidationError> {
        self.check_index(index)?;
        self.state
            .cached_questions
            .insert(index, CachedQuestion { question: question.to_string(), skill });
        Ok(())
    }

    /// Apply the result of a question generation request
    ///
    /// A failure that applies is returned as `Err` after moving the section to
    /// `Errored`.
    pub fn accept_question(
        &mut self,
        tag: RequestTag,
        result: Result<GeneratedQuestion, QuizError>,
    ) -> Result<Delivery<()>, QuizError> {
        if tag.passage != self.state.epoch || tag.section >= self.sections.len() {
            debug!(?tag, "discarding question for a previous passage");
            return Ok(Delivery::Stale);
        }

        match result {
            Ok(question) => {
                let cached = self.state.cached_answers.get(&tag.section);
                let applied =
                    self.sections[tag.section].question_generated(tag.seq, question.clone(), cached);
                if !applied {
                    debug!(?tag, "discarding superseded question");
                    return Ok(Delivery::Stale);
                }
                self.on_question_generated(tag.section, &question.question, question.skill)?;
                Ok(Delivery::Applied(()))
            }
            Err(err) => {
                if self.sections[tag.section].question_failed(tag.seq, err.user_message()) {
                    warn!(section = tag.section, error = %err, "question generation failed");
                    Err(err)
                } else {
                    Ok(Delivery::Stale)
                }
            }
        }
    }

    /// Submit an answer, returning the grading request to send
    pub fn submit(&mut self, index: SectionIndex, text: &str) -> Result<PendingGrading, QuizError> {
        self.check_index(index)?;
        let seq = self.sections[index].submit(text)?;

        let section = &self.sections[index];
        let question = section.question().map(|q| q.question.clone()).unwrap_or_default();
        let request = GradingRequest {
            question,
            answer: section.answer().to_string(),
            paragraph: self.state.passage.section(index).unwrap_or_default().to_string(),
            full_passage: self.state.passage.full_text(),
        };
        let tag = RequestTag { passage: self.state.epoch, section: index, seq };
        Ok(PendingGrading { tag, request })
    }

    /// Apply the result of a grading request
    ///
    /// A failure that applies is returned as `Err` after moving the section
    /// back to `Ready` with the answer kept.
    pub fn accept_grading(
        &mut self,
        tag: RequestTag,
        result: Result<Grading, QuizError>,
    ) -> Result<Delivery<GradingApplied>, QuizError> {
        if tag.passage != self.state.epoch || tag.section >= self.sections.len() {
            debug!(?tag, "discarding grading for a previous passage");
            return Ok(Delivery::Stale);
        }

        match result {
            Ok(grading) => {
                let Some(report) = self.sections[tag.section].graded(tag.seq, grading) else {
                    debug!(?tag, "discarding superseded grading");
                    return Ok(Delivery::Stale);
                };
                let correct_first = report.scored.is_some_and(|s| s.correct_on_first_attempt);
                let completion = self.on_section_scored(
                    report.section,
                    correct_first,
                    &report.answer,
                    &report.grading,
                    report.skill,
                )?;
                Ok(Delivery::Applied(GradingApplied { report, completion }))
            }
            Err(err) => {
                if self.sections[tag.section].grading_failed(tag.seq, err.user_message()) {
                    warn!(section = tag.section, error = %err, "grading failed");
                    Err(err)
                } else {
                    Ok(Delivery::Stale)
                }
            }
        }
    }

    /// Book-keep a graded submission
    ///
    /// Only the first grading of a section is logged and counted; every
    /// grading replaces the cached answer. Returns a completion ticket once
    /// every section is completed and the last section's latest grading is
    /// correct, whatever order the sections were answered in.
    pub fn on_section_scored(
        &mut self,
        index: SectionIndex,
        correct_on_first_attempt: bool,
        answer: &str,
        grading: &Grading,
        skill: ComprehensionSkill,
    ) -> Result<Option<CompletionTicket>, ValidationError> {
        self.check_index(index)?;

        if self.state.completed.insert(index) {
            if correct_on_first_attempt {
                self.state.correct_answers += 1;
            }
            self.state.answered.push(AnsweredQuestion {
                section: index,
                answer: answer.to_string(),
                skill,
                correct_on_first_attempt,
            });
            self.state.correctness.insert(index, correct_on_first_attempt);
        }

        self.state.cached_answers.insert(
            index,
            CachedAnswer { answer: answer.to_string(), grading: grading.clone(), skill },
        );

        let last = self.sections.len() - 1;
        let last_correct =
            self.state.cached_answers.get(&last).is_some_and(|answer| answer.grading.correct);
        let finished = last_correct
            && self.state.completed.len() == self.sections.len()
            && !self.state.complete;
        if finished {
            debug!(epoch = self.state.epoch, "passage completion scheduled");
            return Ok(Some(CompletionTicket { passage: self.state.epoch }));
        }
        Ok(None)
    }

    /// Mark the passage complete. Returns false if the ticket belongs to a
    /// passage that has since been replaced, or the passage is already complete.
    pub fn complete_session(&mut self, ticket: CompletionTicket) -> bool {
        if ticket.passage != self.state.epoch || self.state.complete {
            return false;
        }
        self.state.complete = true;
        let summary = self.summary();
        info!(correct = summary.correct, total = summary.total, "passage complete");
        true
    }

    /// Start the current passage over with a clean record
    pub fn restart(&mut self) -> Result<(), ValidationError> {
        self.load_passage(self.state.passage.clone())
    }

    /// Go back to answering a section after an incorrect grading
    pub fn try_again(&mut self, index: SectionIndex) -> Result<(), QuizError> {
        self.check_index(index)?;
        self.sections[index].try_again()?;
        Ok(())
    }

    /// Generate a passage at `tier` and load it
    ///
    /// On failure the current passage and all its state are left untouched.
    pub async fn request_new_passage<G>(
        &mut self,
        generator: &G,
        tier: DifficultyTier,
    ) -> Result<(), QuizError>
    where
        G: PassageGenerator + ?Sized,
    {
        let request = PassageRequest {
            difficulty: tier,
            reference_length: self.state.passage.char_len(),
            skill_statistics: self.skill_statistics(),
        };

        let mut passage = generator.generate_passage(request).await?;
        if passage.section_count() == 0 {
            return Err(QuizError::Generation("generated passage has no paragraphs".into()));
        }
        if passage.difficulty.is_none() {
            passage.difficulty = Some(tier);
        }
        self.load_passage(passage)?;
        Ok(())
    }

    fn question_request(&self, index: SectionIndex) -> QuestionRequest {
        QuestionRequest {
            paragraph: self.state.passage.section(index).unwrap_or_default().to_string(),
            full_passage: self.state.passage.full_text(),
            passage_title: self.state.passage.title.clone(),
            prioritized_skills: self.prioritized_skills(),
        }
    }

    fn check_index(&self, index: SectionIndex) -> Result<(), ValidationError> {
        if index < self.sections.len() {
            Ok(())
        } else {
            Err(ValidationError::SectionOutOfRange { index, total: self.sections.len() })
        }
    }
}
