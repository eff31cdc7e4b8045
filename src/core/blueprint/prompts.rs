//! Section Prompt Builder
//!
//! Assembles section-aware prompts from lesson/module/course context. Pure:
//! no I/O, same inputs produce the same prompt. The assembled prompt never
//! exceeds `max_chars`; when over budget the section template is truncated
//! first, then the base instructions. The lesson/module/course identifiers
//! are never truncated.

use super::sections::Section;

/// Hard ceiling respecting provider prompt limits.
pub const MAX_PROMPT_CHARS: usize = 3_900;

/// Longest course-context excerpt carried into a prompt.
const MAX_CONTEXT_CHARS: usize = 1_200;

/// Longest continuity excerpt carried from previously generated sections.
const MAX_PRIOR_CHARS: usize = 400;

const BASE_INSTRUCTIONS: &str = "\
You are an expert instructional designer writing one section of an online lesson. \
Write clear, concrete teaching prose for motivated adult learners. Prefer specific \
facts, numbers, and short scenarios over generalities. Do not add markdown headings; \
the surrounding document supplies structure. Do not restate the section name.";

const ENHANCED_INSTRUCTIONS: &str = "\
Ground every claim in the lesson topic, vary sentence length, and address the \
learner directly at least once.";

/// Identifying context for the lesson being generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonContext {
    pub lesson_title: String,
    pub module_title: String,
    pub course_title: String,
    pub course_context: String,
}

impl LessonContext {
    pub fn new(
        lesson_title: impl Into<String>,
        module_title: impl Into<String>,
        course_title: impl Into<String>,
        course_context: impl Into<String>,
    ) -> Self {
        Self {
            lesson_title: lesson_title.into(),
            module_title: module_title.into(),
            course_title: course_title.into(),
            course_context: course_context.into(),
        }
    }
}

/// Builds prompts for section primary content and supporting blocks
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_chars: usize,
    enhanced: bool,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            max_chars: MAX_PROMPT_CHARS,
            enhanced: true,
        }
    }
}

impl PromptBuilder {
    pub fn new(max_chars: usize, enhanced: bool) -> Self {
        Self { max_chars, enhanced }
    }

    /// Build the primary-content prompt for a section.
    pub fn build(&self, section: Section, ctx: &LessonContext, prior: Option<&str>) -> String {
        let identifiers = format!(
            "Lesson: \"{}\" — Module: \"{}\" — Course: \"{}\".",
            ctx.lesson_title, ctx.module_title, ctx.course_title
        );

        let mut fixed_tail = String::new();
        if !ctx.course_context.trim().is_empty() {
            fixed_tail.push_str("\n\nCourse context: ");
            fixed_tail.push_str(&truncate_at_boundary(
                ctx.course_context.trim(),
                MAX_CONTEXT_CHARS,
            ));
        }
        if let Some(prior) = prior.filter(|p| !p.trim().is_empty()) {
            // The most recent output is the useful continuity signal.
            fixed_tail.push_str("\n\nEarlier in this lesson: ");
            fixed_tail.push_str(tail_at_boundary(prior.trim(), MAX_PRIOR_CHARS));
        }

        let mut base = BASE_INSTRUCTIONS.to_string();
        if self.enhanced {
            base.push(' ');
            base.push_str(ENHANCED_INSTRUCTIONS);
        }
        let template = section_template(section, &ctx.lesson_title);

        // Budget: identifiers and context are fixed; the section template
        // shrinks first, base instructions second.
        let joiner_chars = 4; // two "\n\n" joins
        let fixed = identifiers.len() + fixed_tail.len() + joiner_chars;
        let budget = self.max_chars.saturating_sub(fixed);

        let (base, template) = if base.len() + template.len() <= budget {
            (base, template)
        } else {
            let template_budget = budget.saturating_sub(base.len());
            let template = truncate_at_boundary(&template, template_budget);
            if base.len() + template.len() <= budget {
                (base, template)
            } else {
                let base = truncate_at_boundary(&base, budget.saturating_sub(template.len()));
                (base, template)
            }
        };

        let mut prompt = String::with_capacity(self.max_chars.min(4_096));
        prompt.push_str(&base);
        prompt.push_str("\n\n");
        prompt.push_str(&identifiers);
        prompt.push_str("\n\n");
        prompt.push_str(&template);
        prompt.push_str(&fixed_tail);

        debug_assert!(prompt.len() <= self.max_chars.max(identifiers.len() + fixed_tail.len() + joiner_chars));
        prompt
    }

    /// Build a prompt for one supporting block of a section.
    pub fn build_supporting(
        &self,
        section: Section,
        ctx: &LessonContext,
        ask: &str,
    ) -> String {
        let identifiers = format!(
            "Lesson: \"{}\" — Module: \"{}\" — Course: \"{}\".",
            ctx.lesson_title, ctx.module_title, ctx.course_title
        );
        let mut prompt = format!(
            "{}\n\n{}\n\nFor the \"{}\" section: {}",
            BASE_INSTRUCTIONS,
            identifiers,
            section.title(),
            ask
        );
        if prompt.len() > self.max_chars {
            prompt = truncate_at_boundary(&prompt, self.max_chars);
        }
        prompt
    }

    /// Build the image-description prompt for a section illustration.
    pub fn build_image_prompt(&self, section: Section, ctx: &LessonContext) -> String {
        format!(
            "A clean, modern educational illustration for a lesson on \"{}\" \
             (course: \"{}\"), visualizing the {} section. Flat design, soft colors, \
             no embedded text.",
            ctx.lesson_title,
            ctx.course_title,
            section.title()
        )
    }
}

/// Keep the last `max` bytes of `text`, starting at a char boundary.
fn tail_at_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut cut = text.len() - max;
    while cut < text.len() && !text.is_char_boundary(cut) {
        cut += 1;
    }
    &text[cut..]
}

/// Truncate to at most `max` bytes, cutting at a char boundary and trimming
/// a trailing partial word.
fn truncate_at_boundary(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut cut = max;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let slice = &text[..cut];
    match slice.rfind(char::is_whitespace) {
        Some(ws) if ws > 0 => slice[..ws].trim_end().to_string(),
        _ => slice.to_string(),
    }
}

/// The per-section instruction template.
fn section_template(section: Section, lesson_title: &str) -> String {
    match section {
        Section::Overview => format!(
            "Write an engaging overview of \"{lesson_title}\": what it is, why it \
             matters, and what the learner will be able to do afterwards. One or two \
             short paragraphs."
        ),
        Section::Objectives => format!(
            "Write 3-5 measurable learning objectives for \"{lesson_title}\". Each \
             objective starts with an observable action verb (identify, explain, \
             implement, compare, evaluate). One objective per line."
        ),
        Section::KeyTerms => format!(
            "Introduce the 4-6 terms a learner must know before studying \
             \"{lesson_title}\". For each term give a one-sentence plain-language \
             definition, one per line as 'Term: definition'."
        ),
        Section::Concept => format!(
            "Explain the core concept of \"{lesson_title}\" in depth: the underlying \
             mechanism, why it works, and how its parts interact. Use a concrete \
             running example with real values."
        ),
        Section::Example => format!(
            "Walk through one fully worked, realistic example applying \
             \"{lesson_title}\". Show the starting state, each decision, and the \
             outcome with concrete numbers or data."
        ),
        Section::Visual => format!(
            "Describe what a diagram of \"{lesson_title}\" should show, then write a \
             short caption (2-3 sentences) a learner would read next to that diagram."
        ),
        Section::Steps => format!(
            "Give the step-by-step procedure for applying \"{lesson_title}\" in \
             practice. Number each step and keep each to one action plus one sentence \
             of rationale."
        ),
        Section::Mistakes => format!(
            "List the most common mistakes learners make with \"{lesson_title}\", \
             why each happens, and how to avoid it. One mistake per paragraph, \
             most damaging first."
        ),
        Section::Practice => format!(
            "Write a short practice brief for \"{lesson_title}\": one scenario the \
             learner should work through, what to produce, and how to self-check the \
             result."
        ),
        Section::Summary => format!(
            "Summarize the essential takeaways of \"{lesson_title}\" in 3-5 crisp \
             sentences a learner could revisit a week later."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> LessonContext {
        LessonContext::new(
            "Binary Search Trees",
            "Data Structures",
            "CS Fundamentals",
            "An introductory computer science course covering core data structures.",
        )
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let builder = PromptBuilder::default();
        let a = builder.build(Section::Concept, &ctx(), Some("prior text"));
        let b = builder.build(Section::Concept, &ctx(), Some("prior text"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_prompt_contains_identifiers_and_template() {
        let prompt = PromptBuilder::default().build(Section::Objectives, &ctx(), None);
        assert!(prompt.contains("Binary Search Trees"));
        assert!(prompt.contains("CS Fundamentals"));
        assert!(prompt.contains("action verb"));
    }

    #[test]
    fn test_ceiling_respected_with_huge_context() {
        let mut big = ctx();
        big.course_context = "x".repeat(50_000);
        let prompt = PromptBuilder::default().build(Section::Concept, &big, None);
        assert!(prompt.len() <= MAX_PROMPT_CHARS);
    }

    #[test]
    fn test_identifiers_survive_tight_budget() {
        let builder = PromptBuilder::new(400, true);
        let prompt = builder.build(Section::Concept, &ctx(), None);
        // The section template and base instructions give way; the lesson and
        // course names do not.
        assert!(prompt.contains("Binary Search Trees"));
        assert!(prompt.contains("CS Fundamentals"));
    }

    #[test]
    fn test_truncate_at_boundary_trims_partial_word() {
        let out = truncate_at_boundary("alpha beta gamma", 12);
        assert_eq!(out, "alpha beta");
    }

    #[test]
    fn test_tail_keeps_most_recent_text() {
        assert_eq!(tail_at_boundary("abcdef", 3), "def");
        assert_eq!(tail_at_boundary("ab", 3), "ab");
    }

    #[test]
    fn test_image_prompt_mentions_lesson() {
        let prompt = PromptBuilder::default().build_image_prompt(Section::Visual, &ctx());
        assert!(prompt.contains("Binary Search Trees"));
        assert!(prompt.contains("illustration"));
    }
}
