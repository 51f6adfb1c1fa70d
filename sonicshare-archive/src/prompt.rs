//! Vibe vocabulary and prompt generation

use crate::record::TAG_DELIMITER;

/// Built-in vibe tags offered to contributors
pub const VIBE_TAGS: [&str; 18] = [
    "Falsetto",
    "Harmony",
    "Ad-lib",
    "Run",
    "Vibrato",
    "Whisper",
    "Shout",
    "Soulful",
    "Gospel",
    "Neo-Soul",
    "R&B",
    "Ambient",
    "Layered",
    "Loop-ready",
    "Dry",
    "Wet",
    "Reverb",
    "Raw Emotion",
];

const PROMPT_SUFFIX: &str =
    "vocal sample, perfect for genre-bending compositions, AI-enhanced music, or soulful loops.";

/// True if `tag` is one of [`VIBE_TAGS`] (exact match)
pub fn is_vibe_tag(tag: &str) -> bool {
    VIBE_TAGS.contains(&tag)
}

/// Build the AI-ready prompt for a tag selection; empty when no tags
pub fn generate_prompt<S: AsRef<str>>(tags: &[S]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let joined = tags
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(TAG_DELIMITER)
        .to_lowercase();
    format!("A {} {}", joined, PROMPT_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lowercases_and_joins() {
        assert_eq!(
            generate_prompt(&["Falsetto", "Soulful"]),
            "A falsetto, soulful vocal sample, perfect for genre-bending compositions, \
             AI-enhanced music, or soulful loops."
        );
    }

    #[test]
    fn test_prompt_empty_without_tags() {
        let none: [&str; 0] = [];
        assert_eq!(generate_prompt(&none), "");
    }

    #[test]
    fn test_vocabulary_lookup() {
        assert!(is_vibe_tag("Raw Emotion"));
        assert!(is_vibe_tag("R&B"));
        assert!(!is_vibe_tag("raw emotion"));
        assert!(!is_vibe_tag("Polka"));
    }
}
