//! Bulk Course Builder
//!
//! Builds every lesson of a course outline in one settle-all fan-out.
//! Lessons and module thumbnails are independent entities, so unlike the
//! sequential section pipeline they run concurrently; individual failures
//! are discarded and reported in the summary, never propagated.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use super::images::ImagePipeline;
use super::pipeline::{BlueprintPipeline, PipelineConfig};
use super::prompts::LessonContext;
use crate::core::llm::{AssetStore, LessonStore, TextGenerator};

// ============================================================================
// Outline Types
// ============================================================================

/// One module of a course outline
#[derive(Debug, Clone)]
pub struct ModuleOutline {
    pub title: String,
    pub lesson_titles: Vec<String>,
}

/// A whole course outline
#[derive(Debug, Clone)]
pub struct CourseOutline {
    pub course_title: String,
    pub course_context: String,
    pub modules: Vec<ModuleOutline>,
}

/// Summary of a bulk build run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseBuildReport {
    pub lessons_saved: usize,
    pub lessons_failed: usize,
    pub thumbnails_generated: usize,
}

/// Stable lesson identifier derived from module and lesson titles.
pub fn lesson_id(module_title: &str, lesson_title: &str) -> String {
    let slug = |s: &str| {
        s.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    };
    format!("{}--{}", slug(module_title), slug(lesson_title))
}

// ============================================================================
// BulkCourseBuilder
// ============================================================================

/// Fans out lesson generation and thumbnail creation across a course
pub struct BulkCourseBuilder {
    pipeline: BlueprintPipeline,
    images: ImagePipeline,
    store: Arc<dyn LessonStore>,
}

impl BulkCourseBuilder {
    pub fn new(
        client: Arc<dyn TextGenerator>,
        assets: Arc<dyn AssetStore>,
        store: Arc<dyn LessonStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            pipeline: BlueprintPipeline::new(client.clone(), assets.clone(), config),
            images: ImagePipeline::new(client, assets),
            store,
        }
    }

    /// Build and persist every lesson in the outline, plus one thumbnail per
    /// module. Settle-all: the report counts failures, the call never fails.
    pub async fn build(&self, outline: &CourseOutline) -> CourseBuildReport {
        info!(
            course = %outline.course_title,
            modules = outline.modules.len(),
            "bulk course build started"
        );

        let lesson_tasks = outline.modules.iter().flat_map(|module| {
            module.lesson_titles.iter().map(move |lesson_title| {
                self.build_one_lesson(outline, &module.title, lesson_title)
            })
        });
        let thumbnail_tasks = outline
            .modules
            .iter()
            .map(|module| self.build_thumbnail(outline, &module.title));

        let (lesson_results, thumbnail_results) =
            tokio::join!(join_all(lesson_tasks), join_all(thumbnail_tasks));

        let lessons_saved = lesson_results.iter().filter(|ok| **ok).count();
        let report = CourseBuildReport {
            lessons_saved,
            lessons_failed: lesson_results.len() - lessons_saved,
            thumbnails_generated: thumbnail_results.iter().filter(|ok| **ok).count(),
        };

        info!(
            course = %outline.course_title,
            saved = report.lessons_saved,
            failed = report.lessons_failed,
            thumbnails = report.thumbnails_generated,
            "bulk course build finished"
        );
        report
    }

    async fn build_one_lesson(
        &self,
        outline: &CourseOutline,
        module_title: &str,
        lesson_title: &str,
    ) -> bool {
        let ctx = LessonContext::new(
            lesson_title,
            module_title,
            &outline.course_title,
            &outline.course_context,
        );

        let blocks = match self.pipeline.generate(&ctx).await {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!(lesson = %lesson_title, error = %e, "lesson skipped");
                return false;
            }
        };

        let id = lesson_id(module_title, lesson_title);
        match self.store.save_lesson_content(&id, &blocks).await {
            Ok(()) => true,
            Err(e) => {
                warn!(lesson = %id, error = %e, "lesson save failed");
                false
            }
        }
    }

    async fn build_thumbnail(&self, outline: &CourseOutline, module_title: &str) -> bool {
        let prompt = format!(
            "A minimalist course thumbnail for the module \"{}\" in \"{}\". \
             Abstract shapes, two-color palette, no text.",
            module_title, outline.course_title
        );
        self.images
            .generate_section_image(&prompt, module_title)
            .await
            .is_some()
    }
}
