//! Claude API integration
//!
//! Provides API key management, an HTTP client, and the tutor that serves
//! question generation, grading and passage generation through Claude's
//! messages API.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod tutor;

// Re-export commonly used types
pub use auth::ApiKeyManager;
pub use client::ClaudeClient;
pub use error::ClaudeError;
pub use models::{ClaudeModel, CreateMessageRequest, Message, Role};
pub use tutor::ClaudeTutor;
