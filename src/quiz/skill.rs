//! Comprehension skills and difficulty tiers
//!
//! Both are closed sets. The serialized names match the wire format used by
//! the generation service ("Understanding", "beginner", ...).

use serde::{Deserialize, Serialize};

/// Comprehension skill a question is classified under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComprehensionSkill {
    /// Literal comprehension of stated facts
    Understanding,
    /// Inference about implicit meaning
    Reasoning,
    /// Transfer of ideas to new situations
    Application,
}

impl ComprehensionSkill {
    /// All skills in declaration order
    pub const ALL: [ComprehensionSkill; 3] = [Self::Understanding, Self::Reasoning, Self::Application];

    /// Display name (also the wire name)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Understanding => "Understanding",
            Self::Reasoning => "Reasoning",
            Self::Application => "Application",
        }
    }

    /// Description used when asking the generator for a question of this skill
    pub fn description(&self) -> &'static str {
        match self {
            Self::Understanding => {
                "literal comprehension of facts and details directly stated in the text"
            }
            Self::Reasoning => {
                "inferential thinking about implicit meanings, relationships, and conclusions"
            }
            Self::Application => {
                "applying concepts from the text to new situations or real-world scenarios"
            }
        }
    }

    /// Short encouragement shown above a question of this skill
    pub fn soft_prompt(&self) -> &'static str {
        match self {
            Self::Understanding => "Show what you remember from the passage.",
            Self::Reasoning => "Think deeply about what the passage suggests.",
            Self::Application => "How might you use this information?",
        }
    }

    /// Parse a skill name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "understanding" => Some(Self::Understanding),
            "reasoning" => Some(Self::Reasoning),
            "application" => Some(Self::Application),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComprehensionSkill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Content complexity level, ordered from easiest to hardest
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl DifficultyTier {
    /// All tiers, easiest first
    pub const ALL: [DifficultyTier; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    /// Wire identifier
    pub fn id(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Beginner => "Simple vocabulary and straightforward concepts",
            Self::Intermediate => "Moderate complexity with some abstract ideas",
            Self::Advanced => "Complex vocabulary and sophisticated concepts",
        }
    }

    pub fn reading_level(&self) -> &'static str {
        match self {
            Self::Beginner => "Grades 3-5",
            Self::Intermediate => "Grades 6-8",
            Self::Advanced => "Grades 9+",
        }
    }

    /// Parse a tier name. Accepts the relative names "easier", "same" and
    /// "harder" used by older clients.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "easier" | "easy" => Some(Self::Beginner),
            "intermediate" | "same" | "medium" => Some(Self::Intermediate),
            "advanced" | "harder" | "hard" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl std::str::FromStr for DifficultyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("Unknown difficulty: {}. Options: beginner, intermediate, advanced", s)
        })
    }
}

impl std::fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
