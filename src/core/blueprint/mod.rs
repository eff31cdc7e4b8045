//! Blueprint Lesson Generation
//!
//! The lesson content engine: a fixed ten-section blueprint driven through
//! AI text and image generation, assembled into an ordered document of
//! typed content blocks, and rendered to presentation markup.
//!
//! # Module Structure
//!
//! - `blocks`: the `ContentBlock` model and its variant discriminators
//! - `sections`: the ten fixed lesson sections and their profiles
//! - `prompts`: pure prompt assembly with the hard length ceiling
//! - `scorer`: deterministic content-quality heuristics
//! - `refine`: best-of-N generation with early exit
//! - `factory`: block construction, sanitation, diversity caps
//! - `quiz`: defensive quiz parsing (JSON-first, line-based fallback)
//! - `images`: generate-upload-degrade image handling
//! - `pipeline`: the sequential section orchestrator
//! - `renderer`: block-to-HTML conversion
//! - `bulk`: settle-all course-wide fan-out

pub mod blocks;
pub mod bulk;
pub mod factory;
pub mod images;
pub mod pipeline;
pub mod prompts;
pub mod quiz;
pub mod refine;
pub mod renderer;
pub mod scorer;
pub mod sections;

pub use blocks::{
    BlockBody, BlockMetadata, BulletStyle, ChecklistItem, ContentBlock, DividerColor,
    InteractiveVariant, ListVariant, QuoteEntry, QuoteVariant, StatementVariant, TextVariant,
};
pub use bulk::{BulkCourseBuilder, CourseBuildReport, CourseOutline, ModuleOutline};
pub use factory::{enforce_diversity, BlockFactory, DiversityCaps};
pub use images::{ImageAsset, ImagePipeline};
pub use pipeline::{BlueprintPipeline, PipelineConfig, PipelineError, LESSON_COMPLETE};
pub use prompts::{LessonContext, PromptBuilder};
pub use quiz::{parse_quiz_questions, QuestionKind, QuizOption, QuizQuestion};
pub use refine::{generate_with_refinement, Refined, RefinementPolicy};
pub use renderer::{render, render_document};
pub use sections::Section;
