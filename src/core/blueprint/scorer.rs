//! Content Quality Scorer
//!
//! Scores generated text 0-100 against section-specific heuristics. Pure
//! and deterministic: same text + section always yields the same score.
//! The score is advisory: it drives best-of-N selection and the early-exit
//! threshold in the refinement controller.

use once_cell::sync::Lazy;
use regex::Regex;

use super::sections::Section;

const BASE_SCORE: i32 = 50;

/// Bloom's-taxonomy action verbs rewarded in action-oriented sections.
const ACTION_VERBS: &[&str] = &[
    "identify", "describe", "explain", "define", "list", "recall",
    "apply", "implement", "demonstrate", "solve", "use",
    "analyze", "compare", "contrast", "differentiate",
    "evaluate", "justify", "critique", "assess",
    "create", "design", "construct", "build",
];

/// Cue words signalling a concrete example or scenario.
const EXAMPLE_CUES: &[&str] = &[
    "for example", "for instance", "such as", "imagine", "scenario",
    "suppose", "consider", "e.g.", "let's say",
];

/// Cue words signalling specificity rather than generality.
const SPECIFICITY_CUES: &[&str] = &[
    "specifically", "in particular", "precisely", "exactly", "note that",
    "key", "crucial", "important",
];

/// Cue words signalling learner engagement.
const ENGAGEMENT_CUES: &[&str] = &["you", "your", "let's", "try", "notice"];

static LIST_STRUCTURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:[-*•]|\d+[.)])\s+").expect("valid regex"));

/// Score `text` for `section`, clamped to [0, 100].
pub fn score(text: &str, section: Section) -> u8 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0;
    }
    let lower = trimmed.to_lowercase();
    let mut score = BASE_SCORE;

    // Word count inside the section's ideal range.
    let words = trimmed.split_whitespace().count();
    let (lo, hi) = section.ideal_word_range();
    if (lo..=hi).contains(&words) {
        score += 15;
    }

    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        score += 5;
    }

    if EXAMPLE_CUES.iter().any(|cue| lower.contains(cue)) {
        score += 10;
    }

    if SPECIFICITY_CUES.iter().any(|cue| lower.contains(cue)) {
        score += 5;
    }

    if section.is_action_oriented() && contains_word(&lower, ACTION_VERBS) {
        score += 10;
    }

    if LIST_STRUCTURE.is_match(trimmed) {
        score += 5;
    }

    if trimmed.contains('?')
        || trimmed.contains('!')
        || contains_word(&lower, ENGAGEMENT_CUES)
    {
        score += 5;
    }

    score.clamp(0, 100) as u8
}

/// Word-boundary membership test (avoids "you" matching inside "your" being
/// the only signal, and "use" inside "because").
fn contains_word(lower: &str, words: &[&str]) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .any(|token| words.contains(&token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_deterministic_and_bounded() {
        let text = "Imagine inserting 7 keys into a tree. Specifically, you compare each key.";
        let a = score(text, Section::Concept);
        let b = score(text, Section::Concept);
        assert_eq!(a, b);
        assert!(a <= 100);
    }

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(score("", Section::Overview), 0);
        assert_eq!(score("   \n  ", Section::Overview), 0);
    }

    #[test]
    fn test_base_score_for_plain_text() {
        // Short, vague, no cues: nothing beyond the base.
        assert_eq!(score("Generally things happen.", Section::Concept), BASE_SCORE as u8);
    }

    #[rstest]
    #[case(Section::Objectives, true)]
    #[case(Section::Practice, true)]
    #[case(Section::Overview, false)]
    fn test_action_verb_bonus_only_for_action_sections(
        #[case] section: Section,
        #[case] expects_bonus: bool,
    ) {
        let with_verb = "Implement the algorithm on paper.";
        let without = "The algorithm exists on paper.";
        let delta = score(with_verb, section) as i32 - score(without, section) as i32;
        if expects_bonus {
            assert_eq!(delta, 10);
        } else {
            assert_eq!(delta, 0);
        }
    }

    #[test]
    fn test_word_count_bonus() {
        let (lo, _) = Section::Visual.ideal_word_range();
        let in_range = vec!["word"; lo + 5].join(" ");
        let too_short = "word word word";
        assert_eq!(
            score(&in_range, Section::Visual) as i32 - score(too_short, Section::Visual) as i32,
            15
        );
    }

    #[test]
    fn test_list_structure_bonus() {
        let listed = "Steps:\n1. compare\n2. descend";
        let flat = "Steps: compare then descend";
        assert!(score(listed, Section::Steps) > score(flat, Section::Steps));
    }

    #[test]
    fn test_rich_text_scores_high() {
        let text = "Imagine you insert the keys 8, 3, and 10. Specifically:\n\
                    1. Compare 3 with 8 and descend left.\n\
                    2. Compare 10 with 8 and descend right.\n\
                    Notice the invariant? Every left child is smaller!";
        assert!(score(text, Section::Example) >= 80);
    }
}
