/// Lessonforge - AI-Powered Lesson Content Generation Pipeline
///
/// Core library generating complete lesson documents: typed content
/// blocks assembled by a fixed section blueprint, quality-scored AI text,
/// defensively parsed quizzes, and HTML rendering.

pub mod config;
pub mod core;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
