//! Integration tests for the blueprint lesson pipeline.
//!
//! These tests drive the full pipeline against stubbed generation
//! capabilities and verify the structural contract of the produced
//! document:
//!
//! - **Scaffolding**: 11 section boundaries (10 sections + terminal),
//!   heading before and divider after every section
//! - **Degradation**: provider failures shrink sections, never abort runs
//! - **Bulk fan-out**: settle-all semantics across independent lessons
//! - **Rendering**: the generated document renders to markup end to end

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lessonforge::core::blueprint::{
    render_document, BlockBody, BlueprintPipeline, BulkCourseBuilder, CourseOutline,
    DividerColor, LessonContext, ModuleOutline, PipelineConfig, PipelineError, Section,
    TextVariant, LESSON_COMPLETE,
};
use lessonforge::core::llm::{
    AssetStore, GeneratedImage, ImageOptions, LessonStore, LlmError, Result as LlmResult,
    StoredAsset, TextGenerator, TextOptions, UploadOptions,
};

// ============================================================================
// Stub Capabilities
// ============================================================================

/// Generator returning minimal valid content shaped to the request:
/// quiz JSON for quiz prompts, pipe rows for table prompts, short lines
/// otherwise.
struct MinimalGenerator {
    fail_images: bool,
}

#[async_trait]
impl TextGenerator for MinimalGenerator {
    async fn generate_text(&self, prompt: &str, _opts: &TextOptions) -> LlmResult<String> {
        if prompt.contains("JSON array") {
            return Ok(r#"[
                {"question": "Which order do BSTs keep?", "options": ["Sorted", "Random", "Insertion", "Reverse"], "correctAnswer": "Sorted", "explanation": "Ordering is the invariant."},
                {"question": "Is lookup O(log n) when balanced?", "options": ["True", "False"], "correctAnswer": "True"}
            ]"#
            .to_string());
        }
        if prompt.contains("header row") {
            return Ok("Term | Definition\nNode | One element of the tree\nLeaf | A node without children".to_string());
        }
        Ok("A concrete explanation mentioning 3 specific cases.\n\
            Another line with a second point.\n\
            A third line closing the thought."
            .to_string())
    }

    async fn generate_structured(
        &self,
        _system: &str,
        _user: &str,
        _opts: &TextOptions,
    ) -> LlmResult<serde_json::Value> {
        Ok(serde_json::json!({}))
    }

    async fn generate_image(&self, _prompt: &str, _opts: &ImageOptions) -> LlmResult<GeneratedImage> {
        if self.fail_images {
            Err(LlmError::Generation("image provider down".into()))
        } else {
            Ok(GeneratedImage {
                url: "https://provider.example/img.png".into(),
                revised_prompt: None,
            })
        }
    }
}

/// Generator where every call fails.
struct BrokenGenerator;

#[async_trait]
impl TextGenerator for BrokenGenerator {
    async fn generate_text(&self, _p: &str, _o: &TextOptions) -> LlmResult<String> {
        Err(LlmError::Generation("provider offline".into()))
    }
    async fn generate_structured(
        &self,
        _s: &str,
        _u: &str,
        _o: &TextOptions,
    ) -> LlmResult<serde_json::Value> {
        Err(LlmError::Parse("provider offline".into()))
    }
    async fn generate_image(&self, _p: &str, _o: &ImageOptions) -> LlmResult<GeneratedImage> {
        Err(LlmError::Generation("provider offline".into()))
    }
}

struct PassthroughAssets;

#[async_trait]
impl AssetStore for PassthroughAssets {
    async fn upload_asset(&self, source: &str, _o: &UploadOptions) -> LlmResult<StoredAsset> {
        Ok(StoredAsset {
            url: source.replace("provider.example", "cdn.example"),
        })
    }
}

/// Records saves; optionally fails for one lesson id.
struct RecordingStore {
    saved: Mutex<Vec<String>>,
    fail_for: Option<String>,
    calls: AtomicUsize,
}

impl RecordingStore {
    fn new(fail_for: Option<&str>) -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail_for: fail_for.map(String::from),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LessonStore for RecordingStore {
    async fn save_lesson_content(
        &self,
        lesson_id: &str,
        blocks: &[lessonforge::core::blueprint::ContentBlock],
    ) -> LlmResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_for.as_deref() == Some(lesson_id) {
            return Err(LlmError::Save("storage refused".into()));
        }
        assert!(!blocks.is_empty(), "saves receive the whole document");
        self.saved.lock().unwrap().push(lesson_id.to_string());
        Ok(())
    }
}

fn bst_context() -> LessonContext {
    LessonContext::new(
        "Binary Search Trees",
        "Data Structures",
        "CS Fundamentals",
        "An introductory course on core data structures and algorithms.",
    )
}

fn divider_labels(blocks: &[lessonforge::core::blueprint::ContentBlock]) -> Vec<String> {
    blocks
        .iter()
        .filter_map(|b| match &b.body {
            BlockBody::Divider { label, .. } => Some(label.clone().unwrap_or_default()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Structural Contract
// ============================================================================

#[tokio::test]
async fn full_lesson_has_eleven_section_boundaries() {
    let pipeline = BlueprintPipeline::new(
        Arc::new(MinimalGenerator { fail_images: false }),
        Arc::new(PassthroughAssets),
        PipelineConfig::default(),
    );

    let blocks = pipeline.generate(&bst_context()).await.unwrap();

    let labels = divider_labels(&blocks);
    assert_eq!(labels.len(), 11, "10 section dividers + 1 terminal");
    assert_eq!(labels.last().unwrap(), LESSON_COMPLETE);

    // The terminal marker is the document's final block.
    let last = blocks.last().unwrap();
    match &last.body {
        BlockBody::Divider { label, color } => {
            assert_eq!(label.as_deref(), Some(LESSON_COMPLETE));
            assert_eq!(*color, DividerColor::Complete);
        }
        other => panic!("last block must be the completion divider, got {other:?}"),
    }
}

#[tokio::test]
async fn every_section_is_heading_led_and_divider_terminated() {
    let pipeline = BlueprintPipeline::new(
        Arc::new(MinimalGenerator { fail_images: false }),
        Arc::new(PassthroughAssets),
        PipelineConfig::default(),
    );
    let blocks = pipeline.generate(&bst_context()).await.unwrap();

    for section in Section::ALL {
        let heading_pos = blocks
            .iter()
            .position(|b| {
                matches!(&b.body, BlockBody::Text { variant: TextVariant::Heading, text, .. }
                    if text == section.title())
            })
            .unwrap_or_else(|| panic!("missing heading for {section}"));
        let divider_pos = blocks
            .iter()
            .position(|b| {
                matches!(&b.body, BlockBody::Divider { label, .. }
                    if label.as_deref() == Some(section.title()))
            })
            .unwrap_or_else(|| panic!("missing divider for {section}"));
        assert!(heading_pos < divider_pos, "{section} heading must precede its divider");

        // The primary block sits directly after the section heading.
        let primary = &blocks[heading_pos + 1];
        assert!(primary.metadata.is_ai_generated, "{section} primary missing");
    }
}

#[tokio::test]
async fn orders_are_unique_and_ascending() {
    let pipeline = BlueprintPipeline::new(
        Arc::new(MinimalGenerator { fail_images: false }),
        Arc::new(PassthroughAssets),
        PipelineConfig::default(),
    );
    let blocks = pipeline.generate(&bst_context()).await.unwrap();

    let orders: Vec<u32> = blocks.iter().map(|b| b.order).collect();
    let mut sorted = orders.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(orders.len(), sorted.len(), "orders must be unique");
    assert!(orders.windows(2).all(|w| w[0] < w[1]), "authoring order ascends");
}

#[tokio::test]
async fn rich_sections_carry_their_block_mix() {
    let pipeline = BlueprintPipeline::new(
        Arc::new(MinimalGenerator { fail_images: false }),
        Arc::new(PassthroughAssets),
        PipelineConfig::default(),
    );
    let blocks = pipeline.generate(&bst_context()).await.unwrap();

    assert!(
        blocks.iter().any(|b| matches!(b.body, BlockBody::Interactive { .. })),
        "practice section should carry a quiz"
    );
    assert!(
        blocks.iter().any(|b| matches!(b.body, BlockBody::Table { .. })),
        "key terms should carry a table"
    );
    assert!(
        blocks.iter().any(|b| matches!(b.body, BlockBody::Image { .. })),
        "visual sections should carry images"
    );

    // Uploaded image URLs come back re-homed through the asset store.
    for block in &blocks {
        if let BlockBody::Image { url, .. } = &block.body {
            assert!(url.contains("cdn.example"));
            assert_eq!(block.metadata.asset_persisted, Some(true));
        }
    }
}

// ============================================================================
// Degradation
// ============================================================================

#[tokio::test]
async fn image_outage_omits_images_without_failing() {
    let pipeline = BlueprintPipeline::new(
        Arc::new(MinimalGenerator { fail_images: true }),
        Arc::new(PassthroughAssets),
        PipelineConfig::default(),
    );
    let blocks = pipeline.generate(&bst_context()).await.unwrap();

    assert!(
        !blocks.iter().any(|b| matches!(b.body, BlockBody::Image { .. })),
        "failed generations must be omitted, not rendered broken"
    );
    assert_eq!(divider_labels(&blocks).len(), 11);
}

#[tokio::test]
async fn total_provider_failure_still_yields_scaffolding() {
    let pipeline = BlueprintPipeline::new(
        Arc::new(BrokenGenerator),
        Arc::new(PassthroughAssets),
        PipelineConfig::default(),
    );
    let blocks = pipeline.generate(&bst_context()).await.unwrap();

    let labels = divider_labels(&blocks);
    assert_eq!(labels.len(), 11);
    assert_eq!(labels.last().unwrap(), LESSON_COMPLETE);

    // Every section still has a primary: the deterministic fallback.
    let fallbacks = blocks.iter().filter(|b| b.metadata.fallback).count();
    assert_eq!(fallbacks, 10, "one fallback paragraph per section");
    for block in blocks.iter().filter(|b| b.metadata.fallback) {
        match &block.body {
            BlockBody::Text { text, .. } => assert!(text.contains("Binary Search Trees")),
            other => panic!("fallback must be prose, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn empty_lesson_title_is_rejected() {
    let pipeline = BlueprintPipeline::new(
        Arc::new(MinimalGenerator { fail_images: false }),
        Arc::new(PassthroughAssets),
        PipelineConfig::default(),
    );
    let ctx = LessonContext::new("  ", "Module", "Course", "");
    match pipeline.generate(&ctx).await {
        Err(PipelineError::InvalidRequest(_)) => {}
        other => panic!("expected InvalidRequest, got {other:?}"),
    }
}

// ============================================================================
// Rendering Integration
// ============================================================================

#[tokio::test]
async fn generated_document_renders_to_markup() {
    let pipeline = BlueprintPipeline::new(
        Arc::new(MinimalGenerator { fail_images: false }),
        Arc::new(PassthroughAssets),
        PipelineConfig::default(),
    );
    let blocks = pipeline.generate(&bst_context()).await.unwrap();

    let html = render_document(&blocks);
    assert!(html.contains("<h1 class=\"lesson-title\">Binary Search Trees</h1>"));
    assert!(html.contains("divider-complete"));
    assert_eq!(html.matches("<hr").count(), 11);

    // Rendering is repeatable and non-mutating.
    assert_eq!(html, render_document(&blocks));
}

// ============================================================================
// Bulk Fan-Out
// ============================================================================

#[tokio::test]
async fn bulk_build_settles_all_and_reports_failures() {
    let store = Arc::new(RecordingStore::new(Some("module-one--lesson-b")));
    let builder = BulkCourseBuilder::new(
        Arc::new(MinimalGenerator { fail_images: false }),
        Arc::new(PassthroughAssets),
        store.clone(),
        PipelineConfig::default(),
    );

    let outline = CourseOutline {
        course_title: "CS Fundamentals".into(),
        course_context: "Core data structures.".into(),
        modules: vec![
            ModuleOutline {
                title: "Module One".into(),
                lesson_titles: vec!["Lesson A".into(), "Lesson B".into()],
            },
            ModuleOutline {
                title: "Module Two".into(),
                lesson_titles: vec!["Lesson C".into()],
            },
        ],
    };

    let report = builder.build(&outline).await;

    assert_eq!(report.lessons_saved, 2);
    assert_eq!(report.lessons_failed, 1, "storage refusal is absorbed");
    assert_eq!(report.thumbnails_generated, 2);
    assert_eq!(store.calls.load(Ordering::SeqCst), 3);

    let saved = store.saved.lock().unwrap();
    assert!(saved.contains(&"module-one--lesson-a".to_string()));
    assert!(saved.contains(&"module-two--lesson-c".to_string()));
}
