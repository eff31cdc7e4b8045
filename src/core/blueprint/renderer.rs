//! Block Renderer
//!
//! Converts the abstract block model into presentation HTML. Pure mapping:
//! one rule per block type and variant, input blocks never mutated,
//! repeated rendering of the same block yields identical markup. Degenerate
//! payloads (empty lists, empty tables) fall back to the most generic rule
//! for their type instead of emitting broken markup.

use super::blocks::{
    BlockBody, BulletStyle, ContentBlock, DividerColor, InteractiveVariant, ListVariant,
    QuoteVariant, StatementVariant, TextVariant,
};
use super::quiz::QuizQuestion;

/// Escape text for interpolation into HTML content or attributes.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render one block to HTML.
pub fn render(block: &ContentBlock) -> String {
    match &block.body {
        BlockBody::Text {
            variant,
            heading,
            text,
        } => render_text(*variant, heading.as_deref(), text),
        BlockBody::List {
            variant,
            title,
            items,
        } => render_list(*variant, title.as_deref(), items),
        BlockBody::Image { url, alt, caption } => render_image(url, alt, caption.as_deref()),
        BlockBody::Statement { variant, text } => render_statement(*variant, text),
        BlockBody::Quote { variant, entries } => render_quote(*variant, entries),
        BlockBody::Table { headers, rows } => render_table(headers, rows),
        BlockBody::Checklist { title, items } => render_checklist(title.as_deref(), items),
        BlockBody::Link {
            url,
            title,
            description,
        } => render_link(url, title, description.as_deref()),
        BlockBody::Interactive { variant, questions } => render_interactive(*variant, questions),
        BlockBody::Divider { label, color } => render_divider(label.as_deref(), *color),
    }
}

/// Render a whole document: blocks sorted by `order` (gaps tolerated),
/// one markup fragment per block.
pub fn render_document(blocks: &[ContentBlock]) -> String {
    let mut sorted: Vec<&ContentBlock> = blocks.iter().collect();
    sorted.sort_by_key(|b| b.order);
    sorted
        .iter()
        .map(|b| render(b))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Per-Type Rules
// ============================================================================

fn render_text(variant: TextVariant, heading: Option<&str>, text: &str) -> String {
    let text = escape_html(text);
    match variant {
        TextVariant::MasterHeading => format!("<h1 class=\"lesson-title\">{text}</h1>"),
        TextVariant::Heading => format!("<h2>{text}</h2>"),
        TextVariant::Subheading => format!("<h3>{text}</h3>"),
        TextVariant::Paragraph => format!("<p>{text}</p>"),
        TextVariant::HeadingParagraph => {
            let heading = escape_html(heading.unwrap_or_default());
            format!("<section><h2>{heading}</h2><p>{text}</p></section>")
        }
        TextVariant::SubheadingParagraph => {
            let heading = escape_html(heading.unwrap_or_default());
            format!("<section><h3>{heading}</h3><p>{text}</p></section>")
        }
    }
}

fn render_list(variant: ListVariant, title: Option<&str>, items: &[String]) -> String {
    // Generic fallback: a list without items renders as its title alone.
    if items.is_empty() {
        return match title {
            Some(t) => format!("<p>{}</p>", escape_html(t)),
            None => String::new(),
        };
    }

    let li: String = items
        .iter()
        .map(|i| format!("<li>{}</li>", escape_html(i)))
        .collect();
    let heading = title
        .map(|t| format!("<h4>{}</h4>", escape_html(t)))
        .unwrap_or_default();

    match variant {
        ListVariant::Numbered => format!("{heading}<ol>{li}</ol>"),
        ListVariant::Bulleted(style) => {
            let class = match style {
                BulletStyle::Disc => "bullet-disc",
                BulletStyle::Dash => "bullet-dash",
                BulletStyle::Arrow => "bullet-arrow",
            };
            format!("{heading}<ul class=\"{class}\">{li}</ul>")
        }
    }
}

fn render_image(url: &str, alt: &str, caption: Option<&str>) -> String {
    let img = format!(
        "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
        escape_html(url),
        escape_html(alt)
    );
    match caption {
        Some(c) => format!(
            "<figure>{img}<figcaption>{}</figcaption></figure>",
            escape_html(c)
        ),
        None => format!("<figure>{img}</figure>"),
    }
}

fn render_statement(variant: StatementVariant, text: &str) -> String {
    let class = match variant {
        StatementVariant::Note => "callout-note",
        StatementVariant::Tip => "callout-tip",
        StatementVariant::Warning => "callout-warning",
        StatementVariant::KeyIdea => "callout-key",
    };
    format!("<aside class=\"{class}\">{}</aside>", escape_html(text))
}

fn render_quote(variant: QuoteVariant, entries: &[super::blocks::QuoteEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let one = |entry: &super::blocks::QuoteEntry| {
        let cite = entry
            .attribution
            .as_deref()
            .map(|a| format!("<cite>{}</cite>", escape_html(a)))
            .unwrap_or_default();
        format!("<blockquote>{}{cite}</blockquote>", escape_html(&entry.text))
    };

    match variant {
        QuoteVariant::Single => one(&entries[0]),
        QuoteVariant::Carousel => {
            let inner: String = entries
                .iter()
                .map(|e| format!("<div class=\"slide\">{}</div>", one(e)))
                .collect();
            format!("<div class=\"quote-carousel\">{inner}</div>")
        }
    }
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    // Generic fallback: a table without rows degrades to its header line.
    if headers.is_empty() || rows.is_empty() {
        let text = headers.join(", ");
        return if text.is_empty() {
            String::new()
        } else {
            format!("<p>{}</p>", escape_html(&text))
        };
    }

    let head: String = headers
        .iter()
        .map(|h| format!("<th>{}</th>", escape_html(h)))
        .collect();
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|c| format!("<td>{}</td>", escape_html(c)))
                .collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();
    format!("<table><thead><tr>{head}</tr></thead><tbody>{body}</tbody></table>")
}

fn render_checklist(title: Option<&str>, items: &[super::blocks::ChecklistItem]) -> String {
    if items.is_empty() {
        return match title {
            Some(t) => format!("<p>{}</p>", escape_html(t)),
            None => String::new(),
        };
    }

    let heading = title
        .map(|t| format!("<h4>{}</h4>", escape_html(t)))
        .unwrap_or_default();
    let li: String = items
        .iter()
        .map(|item| {
            let checked = if item.checked { " checked" } else { "" };
            format!(
                "<li><input type=\"checkbox\" disabled{checked}> {}</li>",
                escape_html(&item.text)
            )
        })
        .collect();
    format!("{heading}<ul class=\"checklist\">{li}</ul>")
}

fn render_link(url: &str, title: &str, description: Option<&str>) -> String {
    let desc = description
        .map(|d| format!("<p>{}</p>", escape_html(d)))
        .unwrap_or_default();
    format!(
        "<div class=\"resource-link\"><a href=\"{}\" rel=\"noopener\">{}</a>{desc}</div>",
        escape_html(url),
        escape_html(title)
    )
}

fn render_interactive(variant: InteractiveVariant, questions: &[QuizQuestion]) -> String {
    if questions.is_empty() {
        return String::new();
    }
    match variant {
        InteractiveVariant::Quiz => {
            let items: String = questions
                .iter()
                .map(|q| {
                    let options: String = q
                        .options
                        .iter()
                        .map(|o| {
                            let class = if o.is_correct {
                                " class=\"correct\""
                            } else {
                                ""
                            };
                            format!("<li{class}>{}</li>", escape_html(&o.text))
                        })
                        .collect();
                    let explanation = q
                        .explanation
                        .as_deref()
                        .map(|e| format!("<p class=\"explanation\">{}</p>", escape_html(e)))
                        .unwrap_or_default();
                    format!(
                        "<div class=\"question\"><p>{}</p><ol type=\"a\">{options}</ol>{explanation}</div>",
                        escape_html(&q.question)
                    )
                })
                .collect();
            format!("<div class=\"quiz\">{items}</div>")
        }
    }
}

fn render_divider(label: Option<&str>, color: DividerColor) -> String {
    let class = match color {
        DividerColor::Indigo => "divider-indigo",
        DividerColor::Teal => "divider-teal",
        DividerColor::Amber => "divider-amber",
        DividerColor::Violet => "divider-violet",
        DividerColor::Rose => "divider-rose",
        DividerColor::Sky => "divider-sky",
        DividerColor::Emerald => "divider-emerald",
        DividerColor::Orange => "divider-orange",
        DividerColor::Fuchsia => "divider-fuchsia",
        DividerColor::Slate => "divider-slate",
        DividerColor::Complete => "divider-complete",
    };
    match label {
        Some(label) => format!(
            "<hr class=\"{class}\" data-label=\"{}\">",
            escape_html(label)
        ),
        None => format!("<hr class=\"{class}\">"),
    }
}
