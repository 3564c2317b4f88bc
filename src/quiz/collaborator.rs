//! Contracts for the external generation and grading services
//!
//! The engine never talks to a model directly. It hands out requests and
//! accepts results; any implementation of these traits can serve them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::QuizError;
use super::passage::Passage;
use super::skill::{ComprehensionSkill, DifficultyTier};
use super::stats::SkillStatistics;

/// Input for generating one section's question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRequest {
    pub paragraph: String,
    pub full_passage: String,
    pub passage_title: String,
    /// Advisory; empty means no preference
    pub prioritized_skills: Vec<ComprehensionSkill>,
}

/// A generated question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub skill: ComprehensionSkill,
    pub soft_prompt: String,
}

impl GeneratedQuestion {
    /// Question with the skill's standard soft prompt
    pub fn new(question: impl Into<String>, skill: ComprehensionSkill) -> Self {
        Self { question: question.into(), skill, soft_prompt: skill.soft_prompt().to_string() }
    }
}

/// Input for grading one answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradingRequest {
    pub question: String,
    pub answer: String,
    pub paragraph: String,
    pub full_passage: String,
}

/// Outcome of grading an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grading {
    pub correct: bool,
    pub explanation: String,
}

/// Input for generating a new passage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassageRequest {
    pub difficulty: DifficultyTier,
    /// Approximate length in characters to match
    pub reference_length: usize,
    pub skill_statistics: SkillStatistics,
}

/// Generates comprehension questions
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_question(&self, request: QuestionRequest)
    -> Result<GeneratedQuestion, QuizError>;
}

/// Grades learner answers
#[async_trait]
pub trait AnswerGrader: Send + Sync {
    async fn evaluate_answer(&self, request: GradingRequest) -> Result<Grading, QuizError>;
}

/// Generates whole passages
#[async_trait]
pub trait PassageGenerator: Send + Sync {
    async fn generate_passage(&self, request: PassageRequest) -> Result<Passage, QuizError>;
}

/// A service that provides all three operations
pub trait Tutor: QuestionGenerator + AnswerGrader + PassageGenerator {}

impl<T: QuestionGenerator + AnswerGrader + PassageGenerator> Tutor for T {}
