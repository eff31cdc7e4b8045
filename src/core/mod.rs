//! Core engine modules: generation capabilities, the blueprint lesson
//! pipeline, and logging.

pub mod blueprint;
pub mod llm;
pub mod logging;
