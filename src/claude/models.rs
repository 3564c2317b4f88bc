//! Data models for Claude API requests and responses

use serde::{Deserialize, Serialize};

/// Available Claude models
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClaudeModel {
    /// Claude Haiku 4.5 - fast and cost-effective ($1/$5 per MTok)
    #[default]
    Haiku45,
    /// Claude Haiku 3 - legacy fast model ($0.25/$1.25 per MTok)
    Haiku3,
    /// Claude Sonnet 4 - capable ($3/$15 per MTok)
    Sonnet4,
    /// Claude Sonnet 4.5 - latest Sonnet ($3/$15 per MTok)
    Sonnet45,
    /// Claude Opus 4.5 - most capable ($5/$25 per MTok)
    Opus45,
}

impl ClaudeModel {
    /// Get the API model identifier
    pub fn model_id(&self) -> &'static str {
        match self {
            Self::Haiku45 => "claude-haiku-4-5-20251001",
            Self::Haiku3 => "claude-3-haiku-20240307",
            Self::Sonnet4 => "claude-sonnet-4-20250514",
            Self::Sonnet45 => "claude-sonnet-4-5-20250929",
            Self::Opus45 => "claude-opus-4-5-20251101",
        }
    }

    /// Get a human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Haiku45 => "Claude Haiku 4.5",
            Self::Haiku3 => "Claude Haiku 3",
            Self::Sonnet4 => "Claude Sonnet 4",
            Self::Sonnet45 => "Claude Sonnet 4.5",
            Self::Opus45 => "Claude Opus 4.5",
        }
    }

    /// Parse model from string (for command line or model ID)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            // User-friendly names
            "haiku" | "haiku45" | "haiku4.5" => Some(Self::Haiku45),
            "haiku3" => Some(Self::Haiku3),
            "sonnet4" => Some(Self::Sonnet4),
            "sonnet" | "sonnet45" | "sonnet4.5" => Some(Self::Sonnet45),
            "opus" | "opus45" | "opus4.5" => Some(Self::Opus45),
            // Model IDs (for session restoration)
            "claude-haiku-4-5-20251001" => Some(Self::Haiku45),
            "claude-3-haiku-20240307" => Some(Self::Haiku3),
            "claude-sonnet-4-20250514" => Some(Self::Sonnet4),
            "claude-sonnet-4-5-20250929" => Some(Self::Sonnet45),
            "claude-opus-4-5-20251101" => Some(Self::Opus45),
            // Legacy model IDs (for backward compatibility)
            "claude-3-5-haiku-20241022" => Some(Self::Haiku45),
            "claude-3-5-sonnet-20241022" => Some(Self::Sonnet45),
            _ => None,
        }
    }
}

impl std::str::FromStr for ClaudeModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| format!("Unknown model: {}. Options: haiku, haiku3, sonnet4, sonnet, opus", s))
    }
}

/// Message role in conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant (Claude) message
    Assistant,
}

/// A single message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Message content
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Request body for Claude messages API
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Optional system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CreateMessageRequest {
    /// Create a new request with default settings
    pub fn new(model: ClaudeModel, messages: Vec<Message>) -> Self {
        Self {
            model: model.model_id().to_string(),
            max_tokens: 1024,
            messages,
            system: None,
            temperature: None,
        }
    }

    /// Set the system prompt
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Response from Claude messages API
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    /// Message ID
    pub id: String,
    /// Content blocks
    pub content: Vec<ContentBlock>,
    /// Stop reason
    pub stop_reason: Option<String>,
    /// Usage statistics
    pub usage: Usage,
}

impl MessageResponse {
    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Content block in response
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    /// Block type (usually "text")
    #[serde(rename = "type")]
    pub block_type: String,
    /// Text content
    pub text: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    /// Input tokens used
    pub input_tokens: u32,
    /// Output tokens generated
    pub output_tokens: u32,
}
