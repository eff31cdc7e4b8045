//! Blueprint Lesson Pipeline
//!
//! Drives the fixed ten-section lesson blueprint. Sections run sequentially
//! (later sections see an excerpt of earlier output); the supporting blocks
//! inside a section are generated as one concurrent settle-all batch where
//! individual failures shrink the section instead of failing it. The
//! pipeline always terminates, always emits the heading/divider scaffolding,
//! and never surfaces a provider error to its caller.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::blocks::{
    BlockMetadata, BulletStyle, ContentBlock, DividerColor, ListVariant, QuoteEntry,
    QuoteVariant, StatementVariant, TextVariant,
};
use super::factory::{enforce_diversity, split_into_items, BlockFactory, DiversityCaps};
use super::images::{ImageAsset, ImagePipeline};
use super::prompts::{LessonContext, PromptBuilder, MAX_PROMPT_CHARS};
use super::quiz::{parse_quiz_questions, QuizQuestion};
use super::refine::{generate_with_refinement, RefinementPolicy};
use super::sections::Section;
use crate::core::llm::{AssetStore, TextGenerator, TextOptions};

/// Label carried by the terminal divider.
pub const LESSON_COMPLETE: &str = "LESSON COMPLETE";

// ============================================================================
// Configuration
// ============================================================================

/// Explicit pipeline configuration, passed into each run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Generation attempts per primary block.
    pub max_attempts: u32,
    /// Score that short-circuits further attempts.
    pub excellent_score: u8,
    /// Hard prompt-length ceiling in characters.
    pub max_prompt_chars: usize,
    /// Enable the richer prompt preamble.
    pub enhanced_prompts: bool,
    /// Document-wide diversity caps.
    pub caps: DiversityCaps,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            excellent_score: 85,
            max_prompt_chars: MAX_PROMPT_CHARS,
            enhanced_prompts: true,
            caps: DiversityCaps::default(),
        }
    }
}

impl PipelineConfig {
    fn refinement_policy(&self) -> RefinementPolicy {
        RefinementPolicy {
            max_attempts: self.max_attempts,
            excellent_score: self.excellent_score,
            ..RefinementPolicy::default()
        }
    }
}

/// Errors the pipeline surfaces to callers: programmer errors only.
/// Provider failures degrade the document instead of reaching here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// ============================================================================
// Supporting-Block Plans
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SupportKind {
    Paragraph,
    Statement(StatementVariant),
    BulletList,
    NumberedList,
    Checklist,
    Table,
    SingleQuote,
    QuoteCarousel,
    Quiz,
    Image,
}

struct SupportSpec {
    kind: SupportKind,
    ask: &'static str,
}

const fn spec(kind: SupportKind, ask: &'static str) -> SupportSpec {
    SupportSpec { kind, ask }
}

/// The deterministic supporting-block mix for each section. Image entries
/// sit last so the paced image batch follows the concurrent text batch.
/// The mix stays inside the document diversity caps by construction; the
/// caps still run afterwards to catch anything upstream slips in.
fn supporting_plan(section: Section) -> Vec<SupportSpec> {
    use SupportKind::*;
    match section {
        Section::Overview => vec![
            spec(Statement(StatementVariant::Note), "Write one sentence on who this lesson is for."),
            spec(Paragraph, "Explain in one paragraph why this topic matters in real systems."),
            spec(SingleQuote, "Write one short, memorable line a mentor would say about this topic."),
            spec(Paragraph, "Describe in one paragraph where learners will meet this topic in practice."),
        ],
        Section::Objectives => vec![
            spec(Checklist, "List 4 concrete things the learner will be able to do, one per line."),
            spec(Statement(StatementVariant::Tip), "Write one sentence of advice on how to study this lesson."),
            spec(BulletList, "List 3 prerequisites the learner should already know, one per line."),
            spec(Paragraph, "Explain in two sentences how these objectives build on each other."),
        ],
        Section::KeyTerms => vec![
            spec(Table, "Produce a two-column table of 4 key terms and their one-line definitions. Use the format 'Term | Definition', one row per line, first line being the header row."),
            spec(BulletList, "List 3 related terms learners often confuse with these, one per line."),
            spec(Statement(StatementVariant::Note), "Write one sentence on which term is most often misunderstood."),
            spec(Paragraph, "Explain in one paragraph how the key terms relate to each other."),
            spec(SingleQuote, "Write a one-line mnemonic for remembering the most important term."),
        ],
        Section::Concept => vec![
            spec(Paragraph, "Explain the single most important mechanism in one precise paragraph."),
            spec(Statement(StatementVariant::KeyIdea), "State the core invariant of this topic in one sentence."),
            spec(NumberedList, "List the 4 logical stages of how the mechanism works, one per line."),
            spec(SingleQuote, "Write one line capturing the intuition behind the mechanism."),
            spec(Paragraph, "Contrast this approach with its closest alternative in one paragraph."),
            spec(Image, ""),
        ],
        Section::Example => vec![
            spec(QuoteCarousel, "Write 3 one-line takeaways from the worked example, one per line."),
            spec(Table, "Produce a small table tracing the example's state changes. Use the format 'Step | State | Note', one row per line, first line being the header row."),
            spec(NumberedList, "List the decisions made in the example in order, one per line."),
            spec(Statement(StatementVariant::Tip), "Write one sentence on how to adapt this example to a new problem."),
            spec(Paragraph, "Describe one variation of the example and how the outcome changes."),
            spec(Image, ""),
        ],
        Section::Visual => vec![
            spec(Paragraph, "Write a caption paragraph for a diagram of this topic."),
            spec(Statement(StatementVariant::Note), "Write one sentence telling the learner what to look for in the diagram."),
            spec(Image, ""),
            spec(Image, ""),
        ],
        Section::Steps => vec![
            spec(NumberedList, "List the procedure as 5 short imperative steps, one per line."),
            spec(Checklist, "List 4 checks to confirm each step worked, one per line."),
            spec(Statement(StatementVariant::Warning), "Write one sentence on the riskiest step and why."),
            spec(Paragraph, "Explain in one paragraph when to deviate from the standard procedure."),
            spec(Image, ""),
        ],
        Section::Mistakes => vec![
            spec(Statement(StatementVariant::Warning), "State the most common mistake in one sentence."),
            spec(Statement(StatementVariant::Warning), "State the most costly mistake in production in one sentence."),
            spec(Statement(StatementVariant::Tip), "Write one sentence on the habit that prevents most of these mistakes."),
            spec(Paragraph, "Explain in one paragraph how to recover once the most common mistake has happened."),
            spec(BulletList, "List 3 warning signs that a mistake has been made, one per line."),
        ],
        Section::Practice => vec![
            spec(Quiz, ""),
            spec(Checklist, "List 4 self-assessment criteria for the practice task, one per line."),
            spec(Statement(StatementVariant::Tip), "Write one sentence on what to try if the learner gets stuck."),
            spec(Paragraph, "Describe a harder follow-up exercise in one paragraph."),
            spec(SingleQuote, "Write one encouraging line about practicing this skill."),
        ],
        Section::Summary => vec![
            spec(Statement(StatementVariant::KeyIdea), "State the one thing to remember from this lesson."),
            spec(SingleQuote, "Write a one-line parting thought for the learner."),
            spec(Paragraph, "Write one paragraph connecting this lesson to the next topic in the module."),
            spec(Checklist, "List 3 review actions for the learner before moving on, one per line."),
        ],
    }
}

const QUIZ_ASK: &str = "Create 3 multiple-choice questions testing this lesson. Respond with a \
JSON array where each element has \"question\", \"options\" (array of 4 strings), \
\"correctAnswer\" (the exact text of the right option), and \"explanation\".";

// ============================================================================
// Support Payloads
// ============================================================================

/// Parsed result of one supporting generation, wrapped into a block after
/// the batch settles.
enum SupportPayload {
    Text(String),
    Items(Vec<String>),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Quotes(Vec<QuoteEntry>),
    Questions(Vec<QuizQuestion>),
    /// Quiz parsing exhausted every strategy; render the raw text as prose.
    RawQuizText(String),
    Image(ImageAsset, String),
}

// ============================================================================
// BlueprintPipeline
// ============================================================================

/// Generates a complete blueprint lesson as one ordered block document
pub struct BlueprintPipeline {
    client: Arc<dyn TextGenerator>,
    images: ImagePipeline,
    prompts: PromptBuilder,
    config: PipelineConfig,
}

impl BlueprintPipeline {
    pub fn new(
        client: Arc<dyn TextGenerator>,
        assets: Arc<dyn AssetStore>,
        config: PipelineConfig,
    ) -> Self {
        let prompts = PromptBuilder::new(config.max_prompt_chars, config.enhanced_prompts);
        Self {
            images: ImagePipeline::new(client.clone(), assets),
            client,
            prompts,
            config,
        }
    }

    /// Generate the full lesson document.
    ///
    /// Guaranteed non-empty and terminated by the completion divider, even
    /// when every upstream generation fails. Only programmer errors (an
    /// empty lesson title) are returned as `Err`.
    pub async fn generate(
        &self,
        ctx: &LessonContext,
    ) -> Result<Vec<ContentBlock>, PipelineError> {
        if ctx.lesson_title.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "lesson_title must not be empty".to_string(),
            ));
        }

        info!(lesson = %ctx.lesson_title, course = %ctx.course_title, "blueprint generation started");

        let mut factory = BlockFactory::new();
        let mut blocks: Vec<ContentBlock> = Vec::new();
        let mut prior = String::new();

        blocks.push(factory.text(
            TextVariant::MasterHeading,
            &ctx.lesson_title,
            BlockMetadata::scaffolding(),
        ));

        for section in Section::ALL {
            self.run_section(section, ctx, &mut factory, &mut blocks, &mut prior)
                .await;
        }

        blocks.push(factory.divider(Some(LESSON_COMPLETE), DividerColor::Complete));

        let blocks = enforce_diversity(blocks, self.config.caps);
        info!(
            lesson = %ctx.lesson_title,
            blocks = blocks.len(),
            "blueprint generation finished"
        );
        Ok(blocks)
    }

    /// Produce one section: heading, primary content, supporting batch,
    /// divider. Never fails; failures shrink the section.
    async fn run_section(
        &self,
        section: Section,
        ctx: &LessonContext,
        factory: &mut BlockFactory,
        blocks: &mut Vec<ContentBlock>,
        prior: &mut String,
    ) {
        debug!(%section, "section started");
        blocks.push(factory.text(
            TextVariant::Heading,
            section.title(),
            BlockMetadata::scaffolding(),
        ));

        // Primary content via best-of-N refinement.
        let prompt = self.prompts.build(
            section,
            ctx,
            if prior.is_empty() { None } else { Some(prior.as_str()) },
        );
        let opts = TextOptions::new().with_max_tokens(900).with_temperature(0.7);
        let primary = generate_with_refinement(
            self.client.as_ref(),
            section,
            &prompt,
            &opts,
            self.config.refinement_policy(),
        )
        .await;

        match primary {
            Ok(refined) if !refined.fallback => {
                prior.push_str(&refined.content);
                prior.push('\n');
                blocks.push(factory.text(
                    TextVariant::Paragraph,
                    &refined.content,
                    BlockMetadata::ai_generated().with_score(refined.score),
                ));
            }
            outcome => {
                if let Err(e) = outcome {
                    warn!(%section, error = %e, "primary generation failed, using fallback");
                } else {
                    warn!(%section, "no viable primary content, using fallback");
                }
                blocks.push(factory.text(
                    TextVariant::Paragraph,
                    &fallback_paragraph(section, ctx),
                    BlockMetadata::ai_generated().as_fallback(),
                ));
            }
        }

        // Supporting blocks: concurrent settle-all for text, paced batch for
        // images. Failures reduce the count, never abort the section.
        let plan = supporting_plan(section);
        let (image_specs, text_specs): (Vec<_>, Vec<_>) =
            plan.into_iter().partition(|s| s.kind == SupportKind::Image);

        let text_results = join_all(
            text_specs
                .iter()
                .map(|spec| self.generate_support(section, ctx, spec)),
        )
        .await;

        let mut produced = 0usize;
        for (spec, payload) in text_specs.iter().zip(text_results) {
            if let Some(payload) = payload {
                blocks.push(self.wrap_support(factory, spec.kind, payload));
                produced += 1;
            }
        }

        for _ in &image_specs {
            let prompt = self.prompts.build_image_prompt(section, ctx);
            if let Some(asset) = self
                .images
                .generate_section_image(&prompt, &section.to_string())
                .await
            {
                blocks.push(self.wrap_support(
                    factory,
                    SupportKind::Image,
                    SupportPayload::Image(asset, prompt),
                ));
                produced += 1;
            }
            self.images.pace().await;
        }

        if produced < section.min_supporting_blocks() {
            debug!(
                %section,
                produced,
                wanted = section.min_supporting_blocks(),
                "section below supporting-block minimum"
            );
        }

        blocks.push(factory.divider(Some(section.title()), section.divider_color()));
        debug!(%section, "section finished");
    }

    /// Generate and parse one supporting block's content. `None` drops the
    /// block from the section.
    async fn generate_support(
        &self,
        section: Section,
        ctx: &LessonContext,
        spec: &SupportSpec,
    ) -> Option<SupportPayload> {
        let ask = match spec.kind {
            SupportKind::Quiz => QUIZ_ASK,
            _ => spec.ask,
        };
        let prompt = self.prompts.build_supporting(section, ctx, ask);
        let opts = TextOptions::new().with_max_tokens(500).with_temperature(0.8);

        let text = match self.client.generate_text(&prompt, &opts).await {
            Ok(text) if text.trim().len() >= 2 => text,
            Ok(_) => {
                debug!(%section, kind = ?spec.kind, "supporting generation empty, dropping");
                return None;
            }
            Err(e) => {
                warn!(%section, kind = ?spec.kind, error = %e, "supporting generation failed, dropping");
                return None;
            }
        };

        match spec.kind {
            SupportKind::Paragraph | SupportKind::Statement(_) => Some(SupportPayload::Text(text)),
            SupportKind::BulletList | SupportKind::NumberedList | SupportKind::Checklist => {
                let items = split_into_items(&text);
                if items.len() >= 2 {
                    Some(SupportPayload::Items(items))
                } else {
                    None
                }
            }
            SupportKind::Table => parse_table_lines(&text),
            SupportKind::SingleQuote | SupportKind::QuoteCarousel => {
                let limit = if spec.kind == SupportKind::SingleQuote { 1 } else { 4 };
                let entries = parse_quote_lines(&text, limit);
                if entries.is_empty() {
                    None
                } else {
                    Some(SupportPayload::Quotes(entries))
                }
            }
            SupportKind::Quiz => {
                let questions = parse_quiz_questions(&text);
                if questions.is_empty() {
                    warn!(%section, "quiz unrecoverable, rendering raw text");
                    Some(SupportPayload::RawQuizText(text))
                } else {
                    Some(SupportPayload::Questions(questions))
                }
            }
            SupportKind::Image => None, // images run in their own paced batch
        }
    }

    fn wrap_support(
        &self,
        factory: &mut BlockFactory,
        kind: SupportKind,
        payload: SupportPayload,
    ) -> ContentBlock {
        let meta = BlockMetadata::ai_generated();
        match (kind, payload) {
            (SupportKind::Paragraph, SupportPayload::Text(text)) => {
                factory.text(TextVariant::Paragraph, &text, meta)
            }
            (SupportKind::Statement(variant), SupportPayload::Text(text)) => {
                factory.statement(variant, &text, meta)
            }
            (SupportKind::BulletList, SupportPayload::Items(items)) => factory.list(
                ListVariant::Bulleted(BulletStyle::Disc),
                None,
                &items,
                meta,
            ),
            (SupportKind::NumberedList, SupportPayload::Items(items)) => {
                factory.list(ListVariant::Numbered, None, &items, meta)
            }
            (SupportKind::Checklist, SupportPayload::Items(items)) => {
                factory.checklist(None, &items, meta)
            }
            (SupportKind::Table, SupportPayload::Table { headers, rows }) => {
                factory.table(headers, rows, meta)
            }
            (SupportKind::SingleQuote, SupportPayload::Quotes(entries)) => {
                factory.quote(QuoteVariant::Single, entries, meta)
            }
            (SupportKind::QuoteCarousel, SupportPayload::Quotes(entries)) => {
                factory.quote(QuoteVariant::Carousel, entries, meta)
            }
            (SupportKind::Quiz, SupportPayload::Questions(questions)) => {
                factory.quiz(questions, meta)
            }
            (SupportKind::Quiz, SupportPayload::RawQuizText(text)) => {
                factory.text(TextVariant::Paragraph, &text, meta)
            }
            (SupportKind::Image, SupportPayload::Image(asset, prompt)) => {
                let mut meta = meta.with_image_prompt(prompt);
                meta.asset_persisted = Some(asset.persisted);
                factory.image(&asset.url, "Section illustration", None, meta)
            }
            // A payload that does not match its kind is a programming error
            // upstream; degrade to prose rather than panic.
            (_, SupportPayload::Text(text)) | (_, SupportPayload::RawQuizText(text)) => {
                factory.text(TextVariant::Paragraph, &text, meta)
            }
            (_, SupportPayload::Items(items)) => factory.list(
                ListVariant::Bulleted(BulletStyle::Disc),
                None,
                &items,
                meta,
            ),
            (_, SupportPayload::Table { headers, rows }) => factory.table(headers, rows, meta),
            (_, SupportPayload::Quotes(entries)) => {
                factory.quote(QuoteVariant::Single, entries, meta)
            }
            (_, SupportPayload::Questions(questions)) => factory.quiz(questions, meta),
            (_, SupportPayload::Image(asset, prompt)) => {
                let mut meta = meta.with_image_prompt(prompt);
                meta.asset_persisted = Some(asset.persisted);
                factory.image(&asset.url, "Section illustration", None, meta)
            }
        }
    }
}

/// Deterministic stand-in when a section's primary generation fails outright.
fn fallback_paragraph(section: Section, ctx: &LessonContext) -> String {
    format!(
        "The {} content for \"{}\" is part of the {} module in {}. Revisit this \
         section shortly; its full write-up is on the way.",
        section.title(),
        ctx.lesson_title,
        ctx.module_title,
        ctx.course_title
    )
}

/// Parse 'A | B | C' formatted lines into a table. The first line is the
/// header row; ragged rows are dropped.
fn parse_table_lines(text: &str) -> Option<SupportPayload> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|l| l.contains('|') && !l.chars().all(|c| matches!(c, '|' | '-' | ' ' | ':')));

    let headers: Vec<String> = lines
        .next()?
        .split('|')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if headers.len() < 2 {
        return None;
    }

    let rows: Vec<Vec<String>> = lines
        .map(|line| {
            line.split('|')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect::<Vec<String>>()
        })
        .filter(|row| row.len() == headers.len())
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(SupportPayload::Table { headers, rows })
    }
}

/// Turn generated lines into quote entries; an 'text -- attribution' suffix
/// becomes the attribution.
fn parse_quote_lines(text: &str, limit: usize) -> Vec<QuoteEntry> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(limit)
        .map(|line| {
            let (quote, attribution) = match line.rsplit_once(" -- ") {
                Some((q, who)) if !who.trim().is_empty() => (q, Some(who.trim().to_string())),
                _ => (line, None),
            };
            let cleaned = quote
                .trim()
                .trim_matches(|c| c == '"' || c == '\u{201C}' || c == '\u{201D}');
            QuoteEntry {
                text: cleaned.trim().to_string(),
                attribution,
            }
        })
        .filter(|e| !e.text.is_empty())
        .collect()
}
