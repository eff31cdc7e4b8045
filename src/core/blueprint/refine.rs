//! Refinement Controller
//!
//! Runs up to N generation attempts for one prompt, scores each attempt,
//! and keeps the best. An excellent attempt short-circuits the loop. A
//! failed attempt never aborts the request; only the final attempt's error
//! propagates, and only when no earlier attempt produced usable text.

use tracing::{debug, warn};

use super::scorer;
use super::sections::Section;
use crate::core::llm::{LlmError, TextGenerator, TextOptions};

/// Attempt policy for one refinement run
#[derive(Debug, Clone, Copy)]
pub struct RefinementPolicy {
    /// Maximum generation attempts per request.
    pub max_attempts: u32,
    /// Score at which a result is accepted without further attempts.
    pub excellent_score: u8,
    /// Results shorter than this count as failed attempts.
    pub min_viable_chars: usize,
}

impl Default for RefinementPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            excellent_score: 85,
            min_viable_chars: 10,
        }
    }
}

/// Outcome of a refinement run
#[derive(Debug, Clone)]
pub struct Refined {
    pub content: String,
    pub score: u8,
    pub attempts: u32,
    /// No attempt produced viable text; the caller should substitute its
    /// deterministic fallback.
    pub fallback: bool,
}

/// One scored generation attempt (never persisted)
#[derive(Debug)]
struct GenerationAttempt {
    content: String,
    score: u8,
    attempt: u32,
}

/// Generate text for `prompt`, retrying up to the policy's attempt budget
/// and returning the best-scoring result.
pub async fn generate_with_refinement(
    client: &dyn TextGenerator,
    section: Section,
    prompt: &str,
    opts: &TextOptions,
    policy: RefinementPolicy,
) -> Result<Refined, LlmError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut best: Option<GenerationAttempt> = None;

    for attempt in 1..=max_attempts {
        let result = client.generate_text(prompt, opts).await;

        let content = match result {
            Ok(content) => content,
            Err(e) => {
                warn!(%section, attempt, error = %e, "generation attempt errored");
                if attempt == max_attempts && best.is_none() {
                    return Err(e);
                }
                continue;
            }
        };

        if content.trim().len() < policy.min_viable_chars {
            warn!(%section, attempt, chars = content.len(), "generation attempt too short");
            continue;
        }

        let score = scorer::score(&content, section);
        debug!(%section, attempt, score, "generation attempt scored");

        let better = best.as_ref().map(|b| score > b.score).unwrap_or(true);
        if better {
            best = Some(GenerationAttempt {
                content,
                score,
                attempt,
            });
        }

        if score >= policy.excellent_score {
            break;
        }
    }

    match best {
        Some(attempt) => Ok(Refined {
            content: attempt.content,
            score: attempt.score,
            attempts: attempt.attempt,
            fallback: false,
        }),
        None => Ok(Refined {
            content: String::new(),
            score: 0,
            attempts: max_attempts,
            fallback: true,
        }),
    }
}
