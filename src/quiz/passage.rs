//! Reading passage model

use serde::{Deserialize, Serialize};

use super::skill::DifficultyTier;

/// A passage divided into sections, one question per section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Display title
    pub title: String,
    /// Paragraph text of each section, in order
    pub sections: Vec<String>,
    /// Difficulty the passage was written for, if known
    pub difficulty: Option<DifficultyTier>,
}

impl Passage {
    /// Create a passage from already-split sections, dropping blank ones
    pub fn new(title: impl Into<String>, sections: Vec<String>) -> Self {
        let sections = sections
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { title: title.into(), sections, difficulty: None }
    }

    /// Create a passage from text with paragraphs separated by blank lines
    pub fn from_text(title: impl Into<String>, content: &str) -> Self {
        Self::new(title, split_paragraphs(content))
    }

    pub fn with_difficulty(mut self, difficulty: DifficultyTier) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section(&self, index: usize) -> Option<&str> {
        self.sections.get(index).map(String::as_str)
    }

    /// Full text with sections joined by blank lines
    pub fn full_text(&self) -> String {
        self.sections.join("\n\n")
    }

    /// Length of the full text in characters
    pub fn char_len(&self) -> usize {
        self.full_text().chars().count()
    }

    /// The passage every session starts with
    pub fn default_passage() -> Self {
        Self::from_text("The Secret Life of Honeybees", DEFAULT_PASSAGE)
            .with_difficulty(DifficultyTier::Intermediate)
    }
}

/// Split text into paragraphs on blank lines
pub fn split_paragraphs(content: &str) -> Vec<String> {
    let normalized = content.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

const DEFAULT_PASSAGE: &str = "Inside every beehive, there is a world more organized than most human cities. A single hive can contain up to 60,000 bees, and every single one has a job to do.

At the center of the hive is the queen bee. She is the only bee that lays eggs, up to 2,000 per day during summer. Despite her title, the queen doesn't actually make decisions for the hive. Her main job is simply to lay eggs and keep the colony growing.

The worker bees are all female, and they do everything else. Young workers stay inside the hive, cleaning cells, feeding larvae, and building honeycomb from wax they produce from their own bodies. As they get older, they graduate to guarding the hive entrance. The oldest workers become foragers, flying up to five miles from the hive to collect nectar and pollen.

Male bees are called drones. They don't collect food, don't guard the hive, and don't have stingers. Their only purpose is to mate with queens from other hives. In autumn, when food becomes scarce, the workers push the drones out of the hive to conserve resources.

Bees communicate through dancing. When a forager finds a good source of flowers, she returns to the hive and performs a 'waggle dance' that tells other bees exactly where to find the food. The angle of her dance shows the direction relative to the sun, and the length of her waggle shows the distance.

This tiny insect has been making honey the same way for over 100 million years. Every spoonful of honey represents the life's work of about twelve bees.";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_on_blank_lines() {
        let paragraphs = split_paragraphs("One.\n\nTwo.\r\n\r\n\n\nThree.\n\n   ");
        assert_eq!(paragraphs, vec!["One.", "Two.", "Three."]);
    }

    #[test]
    fn single_newlines_stay_in_paragraph() {
        let paragraphs = split_paragraphs("Line one\nline two\n\nNext");
        assert_eq!(paragraphs, vec!["Line one\nline two", "Next"]);
    }

    #[test]
    fn default_passage_has_six_sections() {
        let passage = Passage::default_passage();
        assert_eq!(passage.section_count(), 6);
        assert_eq!(passage.difficulty, Some(DifficultyTier::Intermediate));
        assert!(passage.section(0).unwrap().starts_with("Inside every beehive"));
        assert!(passage.section(6).is_none());
    }

    #[test]
    fn new_drops_blank_sections() {
        let passage = Passage::new("T", vec!["a".into(), "  ".into(), " b ".into()]);
        assert_eq!(passage.sections, vec!["a", "b"]);
        assert_eq!(passage.full_text(), "a\n\nb");
    }
}
