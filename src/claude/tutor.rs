//! Claude-backed question generation, answer grading and passage writing
//!
//! Inputs are trimmed and truncated to fixed limits, and requests missing a
//! required field are rejected before anything is sent. Replies are expected
//! to contain a single JSON object; anything else is a generation or grading
//! failure.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::error::ClaudeError;

use super::client::ClaudeClient;
use super::models::{ClaudeModel, CreateMessageRequest, Message};
use crate::quiz::{
    AnswerGrader, ComprehensionSkill, DifficultyTier, GeneratedQuestion, Grading, GradingRequest,
    Passage, PassageGenerator, PassageRequest, QuestionGenerator, QuestionRequest, QuizError,
    SkillPrioritizer,
};

/// First `{` to last `}` across lines
static JSON_OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Maximum accepted input lengths, in characters
pub mod limits {
    pub const QUESTION: usize = 500;
    pub const ANSWER: usize = 2000;
    pub const PARAGRAPH: usize = 5000;
    pub const PASSAGE: usize = 10000;
    pub const TITLE: usize = 200;
}

/// Used when a passage request carries no reference length
const DEFAULT_REFERENCE_LENGTH: usize = 1000;

/// Serves all three quiz collaborators through Claude
#[derive(Clone)]
pub struct ClaudeTutor {
    client: ClaudeClient,
    model: ClaudeModel,
    /// Decides which skills passage guidance calls weak
    prioritizer: SkillPrioritizer,
}

impl ClaudeTutor {
    pub fn new(client: ClaudeClient, model: ClaudeModel) -> Self {
        Self { client, model, prioritizer: SkillPrioritizer::default() }
    }

    pub fn with_prioritizer(mut self, prioritizer: SkillPrioritizer) -> Self {
        self.prioritizer = prioritizer;
        self
    }

    fn question_request(&self, request: &QuestionRequest) -> Result<CreateMessageRequest, QuizError> {
        let paragraph = sanitize(&request.paragraph, limits::PARAGRAPH);
        if paragraph.is_empty() {
            return Err(QuizError::Generation("paragraph is required".into()));
        }
        let passage = sanitize(&request.full_passage, limits::PASSAGE);
        let title = sanitize(&request.passage_title, limits::TITLE);

        let skills = ComprehensionSkill::ALL
            .iter()
            .map(|s| format!("- {}: {}", s.name(), s.description()))
            .collect::<Vec<_>>()
            .join("\n");

        let focus = if request.prioritized_skills.is_empty() {
            "Choose whichever skill suits this section best.".to_string()
        } else {
            let names: Vec<_> = request.prioritized_skills.iter().map(|s| s.name()).collect();
            format!(
                "The student needs practice with these skills, in priority order: {}. \
                 Prefer the first one that fits this section naturally.",
                names.join(", ")
            )
        };

        let system = format!(
            "You are an expert educator creating reading comprehension questions for children.\n\n\
             Generate ONE question about the current section of the passage. The question must \
             test genuine comprehension rather than memory, be clear and age-appropriate, and be \
             answerable in one or two sentences. Do not ask for definitions.\n\n\
             Each question tests one of these skills:\n{skills}\n\n{focus}\n\n\
             Respond with a JSON object only, in exactly this form:\n\
             {{\"question\": \"...\", \"skill\": \"Understanding\" | \"Reasoning\" | \"Application\"}}"
        );

        let context = if passage.is_empty() { paragraph.as_str() } else { passage.as_str() };
        let title = if title.is_empty() { "Reading Passage" } else { title.as_str() };
        let user = format!(
            "Passage Title: {title}\n\nFull Passage:\n{context}\n\nCurrent Section:\n{paragraph}\n\n\
             Generate ONE comprehension question for this section."
        );

        Ok(CreateMessageRequest::new(self.model, vec![Message::user(user)])
            .with_system(system)
            .with_max_tokens(200)
            .with_temperature(0.7))
    }

    fn grading_request(&self, request: &GradingRequest) -> Result<CreateMessageRequest, QuizError> {
        let question = sanitize(&request.question, limits::QUESTION);
        let answer = sanitize(&request.answer, limits::ANSWER);
        let paragraph = sanitize(&request.paragraph, limits::PARAGRAPH);
        if question.is_empty() || answer.is_empty() || paragraph.is_empty() {
            return Err(QuizError::Grading("missing required fields".into()));
        }
        let passage = sanitize(&request.full_passage, limits::PASSAGE);
        let context = if passage.is_empty() { paragraph.as_str() } else { passage.as_str() };

        let system = "You are an expert educator evaluating reading comprehension answers from \
             children.\n\n\
             Decide whether the answer shows genuine understanding of the text. Judge the idea, \
             not the wording, and accept correct answers phrased differently. Be encouraging but \
             honest, and always cite the part of the passage your judgement rests on.\n\n\
             Respond with a JSON object only, in exactly this form:\n\
             {\"correct\": true or false, \"explanation\": \"two or three sentences\"}";

        let user = format!(
            "Full Passage:\n{context}\n\nSpecific Section:\n{paragraph}\n\n\
             Question Asked:\n{question}\n\nStudent's Answer:\n{answer}\n\n\
             Evaluate the answer. Respond with JSON only."
        );

        Ok(CreateMessageRequest::new(self.model, vec![Message::user(user)])
            .with_system(system)
            .with_max_tokens(200)
            .with_temperature(0.3))
    }

    fn passage_request(&self, request: &PassageRequest) -> CreateMessageRequest {
        let tier = request.difficulty;
        let [vocabulary, sentences, concepts, grade] = tier_guidelines(tier);
        let reference = match request.reference_length {
            0 => DEFAULT_REFERENCE_LENGTH,
            n => n,
        };
        let target_words = reference / 5;

        let mut system = format!(
            "You are an expert educational content creator writing engaging, factual reading \
             passages for children.\n\n\
             DIFFICULTY LEVEL: {}\n- {vocabulary}\n- {sentences}\n- {concepts}\n- Target: {grade}\n\n\
             CONTENT REQUIREMENTS:\n\
             - Topic: an interesting, educational subject (nature, science, history, culture)\n\
             - Length: approximately {target_words} words\n\
             - Structure: 4-6 paragraphs that flow logically\n\
             - All facts must be accurate\n\n\
             Respond with a JSON object only, in exactly this form:\n\
             {{\"title\": \"Engaging Title (3-6 words)\", \"content\": \"Paragraph 1\\n\\nParagraph 2...\"}}\n\
             Separate paragraphs with a blank line. No markdown, no paragraph numbers.",
            tier.id().to_uppercase()
        );

        let stats = &request.skill_statistics;
        if !stats.is_empty() {
            let weak = self.prioritizer.weak_skills(stats);
            let untested: Vec<_> =
                stats.iter().filter(|(_, t)| t.tested == 0).map(|(s, _)| s).collect();
            if !weak.is_empty() || !untested.is_empty() {
                system.push_str("\n\nADAPTIVE LEARNING FOCUS:\n");
                if !weak.is_empty() {
                    system.push_str(&format!("- Student needs practice with: {}\n", join(&weak)));
                }
                if !untested.is_empty() {
                    system.push_str(&format!("- Not yet tested: {}\n", join(&untested)));
                }
                system.push_str(
                    "- Write a passage that naturally supports questions for these skills.",
                );
            }
        }

        let user = format!("Generate a {} reading comprehension passage.", tier.id());
        CreateMessageRequest::new(self.model, vec![Message::user(user)])
            .with_system(system)
            .with_max_tokens(1500)
            .with_temperature(0.8)
    }
}

#[async_trait]
impl QuestionGenerator for ClaudeTutor {
    async fn generate_question(
        &self,
        request: QuestionRequest,
    ) -> Result<GeneratedQuestion, QuizError> {
        let message = self.question_request(&request)?;
        let text = self
            .client
            .complete(&message)
            .await
            .map_err(|e| QuizError::Generation(failure_detail("question generation", &e)))?;
        parse_question(&text, &request.prioritized_skills)
    }
}

#[async_trait]
impl AnswerGrader for ClaudeTutor {
    async fn evaluate_answer(&self, request: GradingRequest) -> Result<Grading, QuizError> {
        let message = self.grading_request(&request)?;
        let text = self
            .client
            .complete(&message)
            .await
            .map_err(|e| QuizError::Grading(failure_detail("grading", &e)))?;
        parse_grading(&text)
    }
}

#[async_trait]
impl PassageGenerator for ClaudeTutor {
    async fn generate_passage(&self, request: PassageRequest) -> Result<Passage, QuizError> {
        let message = self.passage_request(&request);
        let text = self
            .client
            .complete(&message)
            .await
            .map_err(|e| QuizError::Generation(failure_detail("passage generation", &e)))?;
        parse_passage(&text, request.difficulty)
    }
}

/// Log an API failure and describe it, pointing at the key when it was refused
fn failure_detail(stage: &str, error: &ClaudeError) -> String {
    if error.requires_reauth() {
        warn!(stage, error = %error, "Claude rejected the API key; run `lector key <KEY>`");
        format!("{error} (update the key with `lector key <KEY>`)")
    } else {
        warn!(stage, error = %error, retryable = error.is_recoverable(), "Claude request failed");
        error.to_string()
    }
}

/// Writing guidelines per tier: vocabulary, sentences, concepts, grade level
fn tier_guidelines(tier: DifficultyTier) -> [&'static str; 4] {
    match tier {
        DifficultyTier::Beginner => [
            "Use simple, common vocabulary suitable for ages 8-10. Avoid technical terms.",
            "Use shorter sentences (10-15 words average) with simple structure.",
            "Focus on concrete, familiar concepts with straightforward explanations.",
            "4th-5th grade reading level",
        ],
        DifficultyTier::Intermediate => [
            "Use vocabulary for ages 10-12, with some challenging words and context clues.",
            "Use varied sentence structures of moderate complexity (15-20 words average).",
            "Include concrete and some abstract concepts with clear explanations.",
            "6th-7th grade reading level",
        ],
        DifficultyTier::Advanced => [
            "Use advanced vocabulary for ages 12-14, including domain-specific terms.",
            "Use complex sentences with varied structures (20+ words average).",
            "Explore abstract concepts, cause and effect, and nuanced ideas.",
            "8th-9th grade reading level",
        ],
    }
}

fn join(skills: &[ComprehensionSkill]) -> String {
    skills.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
}

/// Trim and cut to at most `max_chars` characters
pub fn sanitize(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect::<String>().trim_end().to_string()
}

/// Parse the first JSON object embedded in `text`
fn extract_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    let object = JSON_OBJECT_RE.find(text)?;
    serde_json::from_str(object.as_str()).ok()
}

#[derive(Deserialize)]
struct QuestionReply {
    question: Option<String>,
    skill: Option<String>,
}

#[derive(Deserialize)]
struct GradingReply {
    correct: Option<bool>,
    explanation: Option<String>,
}

#[derive(Deserialize)]
struct PassageReply {
    title: Option<String>,
    content: Option<String>,
}

/// Parse a question reply. An unknown skill falls back to the first
/// prioritized skill, then to `Understanding`.
pub fn parse_question(
    text: &str,
    prioritized: &[ComprehensionSkill],
) -> Result<GeneratedQuestion, QuizError> {
    let reply: QuestionReply = extract_json(text)
        .ok_or_else(|| QuizError::Generation("reply was not a JSON object".into()))?;

    let question = reply
        .question
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| QuizError::Generation("reply had no question".into()))?;

    let skill = reply
        .skill
        .as_deref()
        .and_then(ComprehensionSkill::parse)
        .or_else(|| prioritized.first().copied())
        .unwrap_or(ComprehensionSkill::Understanding);

    Ok(GeneratedQuestion::new(question, skill))
}

/// Parse a grading reply; both fields are required
pub fn parse_grading(text: &str) -> Result<Grading, QuizError> {
    let reply: GradingReply = extract_json(text)
        .ok_or_else(|| QuizError::Grading("reply was not a JSON object".into()))?;

    match (reply.correct, reply.explanation) {
        (Some(correct), Some(explanation)) => {
            Ok(Grading { correct, explanation: explanation.trim().to_string() })
        }
        _ => Err(QuizError::Grading("reply is missing correct or explanation".into())),
    }
}

/// Parse a passage reply into sections
pub fn parse_passage(text: &str, tier: DifficultyTier) -> Result<Passage, QuizError> {
    let reply: PassageReply = extract_json(text)
        .ok_or_else(|| QuizError::Generation("reply was not a JSON object".into()))?;

    let (Some(title), Some(content)) = (reply.title, reply.content) else {
        return Err(QuizError::Generation("reply is missing title or content".into()));
    };

    let passage = Passage::from_text(title.trim(), &content).with_difficulty(tier);
    if passage.section_count() == 0 {
        return Err(QuizError::Generation("passage has no paragraphs".into()));
    }
    Ok(passage)
}
