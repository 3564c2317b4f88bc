//! Lector - an adaptive reading-comprehension quiz for the terminal
//!
//! A passage is read one section at a time. Each section gets a generated
//! question aimed at the learner's weakest comprehension skill, answers are
//! graded with feedback, and the first-attempt record picks the difficulty of
//! the next passage. Generation and grading are served by Claude.

pub mod app;
pub mod claude;
pub mod config;
pub mod quiz;

pub use app::App;
pub use claude::ClaudeTutor;
pub use config::Config;
pub use quiz::{SessionController, Tutor};
