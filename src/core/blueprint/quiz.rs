//! Quiz Question Parser
//!
//! Recovers quiz questions from unreliable model output. Strategies run in
//! order of preference and each is independently testable:
//! 1. direct JSON parse of the largest bracket-delimited candidate
//! 2. re-parse after common fix-ups (trailing commas, quote styles, bare keys)
//! 3. object-level recovery: parse each `{...}` fragment independently
//! 4. line-based parse of `Q:` / `a)` / `Answer:` formatted text
//!
//! Questions that cannot reach two options are dropped, never emitted
//! malformed; every emitted question has exactly one correct option.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::llm::extract::{array_candidate, object_fragments, strip_code_fences};

// ============================================================================
// Types
// ============================================================================

/// One answer option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub text: String,
    pub is_correct: bool,
}

/// Question style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    McqSingle,
    TrueFalse,
}

/// A validated quiz question: at least two options, exactly one correct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<QuizOption>,
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

// ============================================================================
// Entry Point
// ============================================================================

/// Parse as many valid questions as are recoverable from `raw`.
pub fn parse_quiz_questions(raw: &str) -> Vec<QuizQuestion> {
    let normalized = normalize(raw);

    // Strategy 1: direct parse of the batch array.
    if let Some(questions) = parse_array(&normalized) {
        debug!(count = questions.len(), "quiz parsed via direct JSON");
        return questions;
    }

    // Strategy 2: fix-ups, then re-parse the array.
    let repaired = repair_json(&normalized);
    if repaired != normalized {
        if let Some(questions) = parse_array(&repaired) {
            debug!(count = questions.len(), "quiz parsed after JSON repair");
            return questions;
        }
    }

    // Strategy 3: object-level recovery. Covers single-object payloads,
    // wrapper objects, and batches where one malformed question must not
    // destroy the rest.
    let fragments = fragment_questions(&normalized);
    if !fragments.is_empty() {
        debug!(count = fragments.len(), "quiz parsed via fragment recovery");
        return fragments;
    }

    // Strategy 4: line-based fallback.
    let lines = parse_lines(&normalized);
    if lines.is_empty() {
        warn!(chars = raw.len(), "no quiz questions recoverable");
    } else {
        debug!(count = lines.len(), "quiz parsed via line fallback");
    }
    lines
}

// ============================================================================
// Normalization & Repair
// ============================================================================

fn normalize(raw: &str) -> String {
    strip_code_fences(raw)
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));
static UNQUOTED_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"#).expect("valid regex"));

/// Best-effort repair of near-JSON: trailing commas, single-quoted strings
/// (only when the text carries no double quotes at all), unquoted keys.
fn repair_json(text: &str) -> String {
    let mut repaired = TRAILING_COMMA.replace_all(text, "$1").into_owned();

    if !repaired.contains('"') && repaired.contains('\'') {
        repaired = repaired.replace('\'', "\"");
    }

    repaired = UNQUOTED_KEY.replace_all(&repaired, "$1\"$2\":").into_owned();
    repaired
}

// ============================================================================
// JSON Strategies
// ============================================================================

fn parse_array(text: &str) -> Option<Vec<QuizQuestion>> {
    let candidate = array_candidate(text)?;
    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    let questions = questions_from_value(&value);
    if questions.is_empty() {
        None
    } else {
        Some(questions)
    }
}

fn fragment_questions(text: &str) -> Vec<QuizQuestion> {
    object_fragments(text)
        .into_iter()
        .flat_map(|frag| {
            let parsed: Option<serde_json::Value> = serde_json::from_str(frag)
                .or_else(|_| serde_json::from_str(&repair_json(frag)))
                .ok();
            parsed.map(|v| questions_from_value(&v)).unwrap_or_default()
        })
        .collect()
}

/// Expand a parsed value into questions: a batch array, a wrapper object
/// carrying a `questions` array, or a single question object.
fn questions_from_value(value: &serde_json::Value) -> Vec<QuizQuestion> {
    match value {
        serde_json::Value::Array(items) => {
            items.iter().filter_map(question_from_value).collect()
        }
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::Array(items)) = map.get("questions") {
                items.iter().filter_map(question_from_value).collect()
            } else {
                question_from_value(value).into_iter().collect()
            }
        }
        _ => Vec::new(),
    }
}

// ============================================================================
// Value -> Question Conversion
// ============================================================================

fn str_field<'a>(value: &'a serde_json::Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| value.get(*k).and_then(|v| v.as_str()))
}

fn question_from_value(value: &serde_json::Value) -> Option<QuizQuestion> {
    let question = str_field(value, &["question", "q", "prompt", "text"])?
        .trim()
        .to_string();
    if question.is_empty() {
        return None;
    }

    let raw_options = value
        .get("options")
        .or_else(|| value.get("choices"))
        .or_else(|| value.get("answers"))
        .and_then(|v| v.as_array());

    let mut options: Vec<QuizOption> = Vec::new();
    let mut flagged_correct: Option<usize> = None;

    if let Some(raw_options) = raw_options {
        for raw in raw_options {
            let (text, correct) = match raw {
                serde_json::Value::String(s) => (s.trim().to_string(), false),
                serde_json::Value::Object(_) => {
                    let text = str_field(raw, &["text", "option", "label", "value"])
                        .unwrap_or_default()
                        .trim()
                        .to_string();
                    let correct = raw
                        .get("isCorrect")
                        .or_else(|| raw.get("is_correct"))
                        .or_else(|| raw.get("correct"))
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);
                    (text, correct)
                }
                _ => continue,
            };
            if text.is_empty() {
                continue;
            }
            if correct && flagged_correct.is_none() {
                flagged_correct = Some(options.len());
            }
            options.push(QuizOption {
                text,
                is_correct: false,
            });
        }
    }

    // True/False questions sometimes arrive with no options at all.
    if options.is_empty() {
        if let Some(answer) = str_field(value, &["correctAnswer", "correct_answer", "answer"]) {
            if is_true_false_answer(answer) {
                options = true_false_options();
            }
        }
    }

    if options.len() < 2 {
        warn!(question = %question, "dropping quiz question with fewer than 2 options");
        return None;
    }

    let correct_index = flagged_correct.unwrap_or_else(|| {
        value
            .get("correctAnswer")
            .or_else(|| value.get("correct_answer"))
            .or_else(|| value.get("answer"))
            .or_else(|| value.get("correct"))
            .map(|answer| resolve_correct_index(&options, answer))
            .unwrap_or(0)
    });

    for (i, option) in options.iter_mut().enumerate() {
        option.is_correct = i == correct_index;
    }

    let kind = classify_kind(value, &options);
    let explanation = str_field(value, &["explanation", "rationale"])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(QuizQuestion {
        question,
        options,
        kind,
        explanation,
    })
}

fn classify_kind(value: &serde_json::Value, options: &[QuizOption]) -> QuestionKind {
    if let Some(t) = str_field(value, &["type", "kind"]) {
        let t = t.to_lowercase();
        if t.contains("true") || t.contains("tf") {
            return QuestionKind::TrueFalse;
        }
    }
    if options.len() == 2 && options.iter().all(|o| is_true_false_answer(&o.text)) {
        return QuestionKind::TrueFalse;
    }
    QuestionKind::McqSingle
}

fn is_true_false_answer(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "true" | "false")
}

fn true_false_options() -> Vec<QuizOption> {
    vec![
        QuizOption {
            text: "True".to_string(),
            is_correct: false,
        },
        QuizOption {
            text: "False".to_string(),
            is_correct: false,
        },
    ]
}

// ============================================================================
// Correct-Answer Resolution
// ============================================================================

static OPTION_LETTER_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^option\s+([a-z])$").expect("valid regex"));

/// Resolve which option an `answer` value designates.
///
/// Priority: exact text match, case-insensitive match, "Option A" letter
/// reference, bare letter, numeric index. Falls back to option 0 when the
/// model's answer matches nothing.
fn resolve_correct_index(options: &[QuizOption], answer: &serde_json::Value) -> usize {
    if let Some(n) = answer.as_u64() {
        return index_from_number(n as usize, options.len());
    }

    let Some(raw) = answer.as_str() else {
        return 0;
    };
    let answer_text = raw.trim();

    if let Some(i) = options.iter().position(|o| o.text == answer_text) {
        return i;
    }

    let lower = answer_text.to_lowercase();
    if let Some(i) = options.iter().position(|o| o.text.to_lowercase() == lower) {
        return i;
    }

    if let Some(caps) = OPTION_LETTER_REF.captures(answer_text) {
        let letter = caps[1].chars().next().unwrap_or('a').to_ascii_lowercase();
        let idx = (letter as u8).saturating_sub(b'a') as usize;
        if idx < options.len() {
            return idx;
        }
    }

    if answer_text.len() == 1 {
        let ch = answer_text.chars().next().unwrap_or('a').to_ascii_lowercase();
        if ch.is_ascii_lowercase() {
            let idx = (ch as u8 - b'a') as usize;
            if idx < options.len() {
                return idx;
            }
        }
    }

    if let Ok(n) = answer_text.parse::<usize>() {
        return index_from_number(n, options.len());
    }

    warn!(answer = %answer_text, "unresolvable correct answer, defaulting to first option");
    0
}

/// 0-indexed when in range; tolerate 1-indexed answers that would otherwise
/// point one past the end.
fn index_from_number(n: usize, len: usize) -> usize {
    if n < len {
        n
    } else if n >= 1 && n - 1 < len {
        n - 1
    } else {
        0
    }
}

// ============================================================================
// Line-Based Fallback
// ============================================================================

static QUESTION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*q(?:uestion)?\s*\d*\s*[:.)]\s*(.+)$").expect("valid regex"));
static OPTION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*([a-h])[).]\s+(.+)$").expect("valid regex"));
static ANSWER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*answer\s*[:\-]\s*(.+)$").expect("valid regex"));

#[derive(Default)]
struct LineAccumulator {
    question: Option<String>,
    options: Vec<QuizOption>,
    answer: Option<String>,
}

impl LineAccumulator {
    fn finish(&mut self) -> Option<QuizQuestion> {
        let question = self.question.take()?;
        let mut options = std::mem::take(&mut self.options);
        let answer = self.answer.take();

        // "Answer: True" with no listed options implies a True/False question.
        if options.is_empty() {
            if let Some(ref a) = answer {
                if is_true_false_answer(a) {
                    options = true_false_options();
                }
            }
        }

        if options.len() < 2 {
            return None;
        }

        let correct = answer
            .map(|a| resolve_correct_index(&options, &serde_json::Value::String(a)))
            .unwrap_or(0);
        for (i, option) in options.iter_mut().enumerate() {
            option.is_correct = i == correct;
        }

        let kind = if options.len() == 2 && options.iter().all(|o| is_true_false_answer(&o.text)) {
            QuestionKind::TrueFalse
        } else {
            QuestionKind::McqSingle
        };

        Some(QuizQuestion {
            question,
            options,
            kind,
            explanation: None,
        })
    }
}

fn parse_lines(text: &str) -> Vec<QuizQuestion> {
    let mut questions = Vec::new();
    let mut acc = LineAccumulator::default();

    for line in text.lines() {
        if let Some(caps) = QUESTION_LINE.captures(line) {
            if let Some(done) = acc.finish() {
                questions.push(done);
            }
            acc.question = Some(caps[1].trim().to_string());
        } else if let Some(caps) = OPTION_LINE.captures(line) {
            if acc.question.is_some() {
                acc.options.push(QuizOption {
                    text: caps[2].trim().to_string(),
                    is_correct: false,
                });
            }
        } else if let Some(caps) = ANSWER_LINE.captures(line) {
            if acc.question.is_some() {
                acc.answer = Some(caps[1].trim().to_string());
            }
        }
    }

    if let Some(done) = acc.finish() {
        questions.push(done);
    }
    questions
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(q: &QuizQuestion) {
        assert!(q.options.len() >= 2);
        assert_eq!(q.options.iter().filter(|o| o.is_correct).count(), 1);
    }

    #[test]
    fn test_direct_json_array() {
        let raw = r#"[
            {"question": "What is the BST invariant?",
             "options": ["Left < node < right", "All equal", "Random", "Sorted array"],
             "correctAnswer": "Left < node < right",
             "explanation": "Ordering is the defining property."}
        ]"#;
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions.len(), 1);
        assert_valid(&questions[0]);
        assert!(questions[0].options[0].is_correct);
        assert_eq!(questions[0].kind, QuestionKind::McqSingle);
    }

    #[test]
    fn test_fenced_json_with_prose() {
        let raw = "Here are your questions!\n```json\n[{\"question\": \"Is a BST ordered?\", \"options\": [\"True\", \"False\"], \"correctAnswer\": \"True\"}]\n```\nEnjoy!";
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].kind, QuestionKind::TrueFalse);
        assert!(questions[0].options[0].is_correct);
    }

    #[test]
    fn test_trailing_commas_repaired() {
        let raw = r#"[{"question": "Pick one", "options": ["a1", "a2",], "correctAnswer": "a2",},]"#;
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions.len(), 1);
        assert!(questions[0].options[1].is_correct);
    }

    #[test]
    fn test_single_quotes_repaired() {
        let raw = "[{'question': 'Pick one', 'options': ['first', 'second'], 'correctAnswer': 'second'}]";
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions.len(), 1);
        assert!(questions[0].options[1].is_correct);
    }

    #[test]
    fn test_unquoted_keys_repaired() {
        let raw = r#"[{question: "Pick one", options: ["x", "y"], correctAnswer: "y"}]"#;
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions.len(), 1);
        assert!(questions[0].options[1].is_correct);
    }

    #[test]
    fn test_fragment_recovery_salvages_valid_objects() {
        // Middle object is irreparably malformed; the other four must survive.
        let raw = r#"
            {"question": "Q1", "options": ["a", "b"], "correctAnswer": "a"}
            {"question": "Q2", "options": ["a", "b"], "correctAnswer": "b"}
            {"question": "Q3", "options": [}BROKEN{]
            {"question": "Q4", "options": ["a", "b"], "correctAnswer": "a"}
            {"question": "Q5", "options": ["a", "b"], "correctAnswer": "b"}
        "#;
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions.len(), 4);
        for q in &questions {
            assert_valid(q);
        }
    }

    #[test]
    fn test_options_with_flags_win_over_answer_field() {
        let raw = r#"[{"question": "Q", "options":
            [{"text": "wrong", "isCorrect": false}, {"text": "right", "isCorrect": true}],
            "correctAnswer": "wrong"}]"#;
        let questions = parse_quiz_questions(raw);
        assert!(questions[0].options[1].is_correct);
        assert!(!questions[0].options[0].is_correct);
    }

    #[test]
    fn test_line_based_fallback() {
        let raw = "\
            Q: What is the height of a balanced BST with 7 nodes?\n\
            a) 2\n\
            b) 3\n\
            c) 7\n\
            d) 1\n\
            Answer: b\n\
            \n\
            Q: A BST allows duplicate keys by default.\n\
            Answer: False\n";
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions.len(), 2);
        assert_valid(&questions[0]);
        assert!(questions[0].options[1].is_correct);
        assert_eq!(questions[1].kind, QuestionKind::TrueFalse);
        assert!(questions[1].options[1].is_correct);
    }

    #[test]
    fn test_too_few_options_dropped() {
        let raw = r#"[
            {"question": "Lonely", "options": ["only one"], "correctAnswer": "only one"},
            {"question": "Fine", "options": ["a", "b"], "correctAnswer": "b"}
        ]"#;
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Fine");
    }

    #[test]
    fn test_answer_resolution_priority() {
        let options = vec![
            QuizOption { text: "Alpha".into(), is_correct: false },
            QuizOption { text: "beta".into(), is_correct: false },
            QuizOption { text: "Gamma".into(), is_correct: false },
        ];
        let s = |v: &str| serde_json::Value::String(v.to_string());

        assert_eq!(resolve_correct_index(&options, &s("Alpha")), 0);
        assert_eq!(resolve_correct_index(&options, &s("BETA")), 1);
        assert_eq!(resolve_correct_index(&options, &s("Option C")), 2);
        assert_eq!(resolve_correct_index(&options, &s("c")), 2);
        assert_eq!(resolve_correct_index(&options, &s("2")), 2);
        assert_eq!(resolve_correct_index(&options, &serde_json::json!(1)), 1);
        assert_eq!(resolve_correct_index(&options, &s("no such option")), 0);
    }

    #[test]
    fn test_one_indexed_numeric_answer_tolerated() {
        let options = vec![
            QuizOption { text: "a".into(), is_correct: false },
            QuizOption { text: "b".into(), is_correct: false },
        ];
        // 2 is out of range 0-indexed but valid 1-indexed.
        assert_eq!(resolve_correct_index(&options, &serde_json::json!(2)), 1);
    }

    #[test]
    fn test_wrapper_object_with_questions_array() {
        let raw = r#"{"questions": [{"question": "Q", "options": ["a", "b"], "answer": "b"}]}"#;
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions.len(), 1);
        assert!(questions[0].options[1].is_correct);
    }

    #[test]
    fn test_garbage_yields_empty() {
        assert!(parse_quiz_questions("complete nonsense, no structure").is_empty());
        assert!(parse_quiz_questions("").is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The parser never panics and never emits a malformed question,
            /// whatever bytes arrive.
            #[test]
            fn parser_output_always_valid(raw in ".{0,400}") {
                for q in parse_quiz_questions(&raw) {
                    prop_assert!(q.options.len() >= 2);
                    prop_assert_eq!(q.options.iter().filter(|o| o.is_correct).count(), 1);
                }
            }

            /// Well-formed question arrays round-trip regardless of wrapping.
            #[test]
            fn valid_json_recovers_all(count in 1usize..6, fence in proptest::bool::ANY) {
                let questions: Vec<serde_json::Value> = (0..count)
                    .map(|i| serde_json::json!({
                        "question": format!("Question {i}?"),
                        "options": ["one", "two", "three", "four"],
                        "correctAnswer": "two",
                        "explanation": "because"
                    }))
                    .collect();
                let json = serde_json::to_string(&questions).unwrap();
                let raw = if fence {
                    format!("```json\n{json}\n```")
                } else {
                    json
                };
                let parsed = parse_quiz_questions(&raw);
                prop_assert_eq!(parsed.len(), count);
                for q in parsed {
                    prop_assert!(q.options[1].is_correct);
                }
            }
        }
    }
}
