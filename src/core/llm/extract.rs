//! JSON Extraction from Model Output
//!
//! Completions rarely arrive as clean JSON: they come wrapped in markdown
//! fences, preceded by prose, or interleaved with commentary. The helpers
//! here pull JSON payloads out of that noise with string-aware brace
//! scanning so braces inside string literals don't confuse the depth count.

// ============================================================================
// Fenced Blocks
// ============================================================================

/// Strip markdown code fences, returning the inner content of the first
/// fenced block if one exists, otherwise the input unchanged.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    // Skip the fence line itself (```json, ```JSON, bare ```)
    let after_fence = &trimmed[start + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

// ============================================================================
// Balanced Scanning
// ============================================================================

/// Find the first balanced `open`..`close` span starting at or after `from`,
/// ignoring delimiters inside JSON string literals.
fn balanced_span(text: &str, from: usize, open: char, close: char) -> Option<(usize, usize)> {
    let start = text[from..].find(open)? + from;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + i + ch.len_utf8()));
                }
            }
            _ => {}
        }
    }
    None
}

/// The first balanced `[...]` span in the text, fences stripped.
pub fn array_candidate(text: &str) -> Option<&str> {
    let text = strip_code_fences(text);
    balanced_span(text, 0, '[', ']').map(|(a0, a1)| &text[a0..a1])
}

/// Extract the largest bracket-delimited JSON candidate from raw model
/// output. Arrays are preferred over objects so a question batch wins over
/// a single leading object.
pub fn extract_json_candidate(text: &str) -> Option<&str> {
    let text = strip_code_fences(text);
    let array = balanced_span(text, 0, '[', ']');
    let object = balanced_span(text, 0, '{', '}');

    match (array, object) {
        (Some((a0, a1)), Some((o0, o1))) => {
            // An object that merely sits inside the array is not a competitor.
            if o0 >= a0 && o1 <= a1 {
                Some(&text[a0..a1])
            } else if a1 - a0 >= o1 - o0 {
                Some(&text[a0..a1])
            } else {
                Some(&text[o0..o1])
            }
        }
        (Some((a0, a1)), None) => Some(&text[a0..a1]),
        (None, Some((o0, o1))) => Some(&text[o0..o1]),
        (None, None) => None,
    }
}

/// Parse the first JSON value recoverable from raw model output.
pub fn parse_first_json(text: &str) -> Option<serde_json::Value> {
    let candidate = extract_json_candidate(text)?;
    serde_json::from_str(candidate).ok()
}

/// Split text into independent top-level `{...}` fragments.
///
/// Used for object-level recovery: when a batch of objects fails to parse as
/// a whole, each fragment can still be parsed on its own.
pub fn object_fragments(text: &str) -> Vec<&str> {
    let text = strip_code_fences(text);
    let mut fragments = Vec::new();
    let mut cursor = 0usize;

    while let Some(rel) = text[cursor..].find('{') {
        let start = cursor + rel;
        match balanced_span(text, start, '{', '}') {
            Some((s, e)) => {
                fragments.push(&text[s..e]);
                cursor = e;
            }
            // An open brace that never closes must not hide later objects.
            None => cursor = start + 1,
        }
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"a\": 1}");
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_prefers_array_over_inner_object() {
        let text = "Here you go: [{\"q\": \"one\"}, {\"q\": \"two\"}] hope it helps";
        let candidate = extract_json_candidate(text).unwrap();
        assert!(candidate.starts_with('['));
        assert!(candidate.ends_with(']'));
    }

    #[test]
    fn test_extract_object_when_no_array() {
        let text = "The result {\"name\": \"BST\", \"depth\": 3} as requested.";
        let parsed = parse_first_json(text).unwrap();
        assert_eq!(parsed["name"], "BST");
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let text = r#"{"text": "use { and } freely", "n": 1}"#;
        let parsed = parse_first_json(text).unwrap();
        assert_eq!(parsed["n"], 1);
    }

    #[test]
    fn test_object_fragments_skip_prose() {
        let text = r#"first {"a": 1} then {"b": 2} done"#;
        let frags = object_fragments(text);
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0], r#"{"a": 1}"#);
        assert_eq!(frags[1], r#"{"b": 2}"#);
    }

    #[test]
    fn test_fragments_survive_unclosed_brace() {
        let text = r#"{"a": 1} {broken {"b": 2}"#;
        let frags = object_fragments(text);
        assert!(frags.contains(&r#"{"a": 1}"#));
        assert!(frags.contains(&r#"{"b": 2}"#));
    }

    #[test]
    fn test_no_json_returns_none() {
        assert!(parse_first_json("no structured data here").is_none());
        assert!(extract_json_candidate("plain text").is_none());
    }
}
