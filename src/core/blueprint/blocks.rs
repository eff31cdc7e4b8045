//! Lesson Content Blocks
//!
//! The atomic unit of a lesson is a typed `ContentBlock`: an id, a render
//! position, a tagged-union body, and generation metadata. A finished lesson
//! is an ordered sequence of blocks; blocks never reference each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::quiz::QuizQuestion;

// ============================================================================
// Variant Discriminators
// ============================================================================

/// Text block variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextVariant {
    MasterHeading,
    Heading,
    Subheading,
    Paragraph,
    HeadingParagraph,
    SubheadingParagraph,
}

/// Bullet glyph allow-list for bulleted lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BulletStyle {
    #[default]
    Disc,
    Dash,
    Arrow,
}

/// List block variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListVariant {
    Numbered,
    Bulleted(BulletStyle),
}

/// Statement (callout) variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementVariant {
    Note,
    Tip,
    Warning,
    KeyIdea,
}

/// Quote block variants; at most one carousel per document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteVariant {
    Single,
    Carousel,
}

/// Interactive block variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractiveVariant {
    Quiz,
}

/// Divider accent colors, one per lesson section plus the terminal marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividerColor {
    Indigo,
    Teal,
    Amber,
    Violet,
    Rose,
    Sky,
    Emerald,
    Orange,
    Fuchsia,
    Slate,
    Complete,
}

// ============================================================================
// Payload Types
// ============================================================================

/// One quote inside a quote block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteEntry {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

/// One item inside a checklist block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    pub checked: bool,
}

// ============================================================================
// Block Body
// ============================================================================

/// The tagged-union payload of a content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockBody {
    Text {
        variant: TextVariant,
        /// Present for the compound heading+paragraph variants.
        #[serde(skip_serializing_if = "Option::is_none")]
        heading: Option<String>,
        text: String,
    },
    List {
        variant: ListVariant,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        items: Vec<String>,
    },
    Image {
        url: String,
        alt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Statement {
        variant: StatementVariant,
        text: String,
    },
    Quote {
        variant: QuoteVariant,
        entries: Vec<QuoteEntry>,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Checklist {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        items: Vec<ChecklistItem>,
    },
    Link {
        url: String,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Interactive {
        variant: InteractiveVariant,
        questions: Vec<QuizQuestion>,
    },
    Divider {
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        color: DividerColor,
    },
}

impl BlockBody {
    /// Stable type name, matching the serialized `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            BlockBody::Text { .. } => "text",
            BlockBody::List { .. } => "list",
            BlockBody::Image { .. } => "image",
            BlockBody::Statement { .. } => "statement",
            BlockBody::Quote { .. } => "quote",
            BlockBody::Table { .. } => "table",
            BlockBody::Checklist { .. } => "checklist",
            BlockBody::Link { .. } => "link",
            BlockBody::Interactive { .. } => "interactive",
            BlockBody::Divider { .. } => "divider",
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Generation metadata attached to every block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    pub is_ai_generated: bool,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    /// `Some(false)` when an image block carries an ephemeral provider URL
    /// because the durable upload failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_persisted: Option<bool>,
    /// Deterministic fallback content was substituted for a failed generation.
    pub fallback: bool,
}

impl BlockMetadata {
    pub fn ai_generated() -> Self {
        Self {
            quality_score: None,
            is_ai_generated: true,
            generated_at: Utc::now(),
            image_prompt: None,
            asset_persisted: None,
            fallback: false,
        }
    }

    pub fn scaffolding() -> Self {
        Self {
            is_ai_generated: false,
            ..Self::ai_generated()
        }
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.quality_score = Some(score);
        self
    }

    pub fn with_image_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.image_prompt = Some(prompt.into());
        self
    }

    pub fn as_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }
}

// ============================================================================
// ContentBlock
// ============================================================================

/// One atomic, typed unit of lesson content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Opaque unique identifier.
    pub id: String,
    /// Render position; unique per document, gap-free in authoring order.
    pub order: u32,
    #[serde(flatten)]
    pub body: BlockBody,
    pub metadata: BlockMetadata,
}

impl ContentBlock {
    pub fn new(order: u32, body: BlockBody, metadata: BlockMetadata) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order,
            body,
            metadata,
        }
    }

    pub fn is_divider(&self) -> bool {
        matches!(self.body, BlockBody::Divider { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_type_names() {
        let body = BlockBody::Text {
            variant: TextVariant::Paragraph,
            heading: None,
            text: "hello".to_string(),
        };
        assert_eq!(body.type_name(), "text");

        let divider = BlockBody::Divider {
            label: Some("LESSON COMPLETE".to_string()),
            color: DividerColor::Complete,
        };
        assert_eq!(divider.type_name(), "divider");
    }

    #[test]
    fn test_block_serialization_shape() {
        let block = ContentBlock::new(
            3,
            BlockBody::Statement {
                variant: StatementVariant::Warning,
                text: "Unbalanced trees degrade to linked lists.".to_string(),
            },
            BlockMetadata::ai_generated().with_score(72),
        );

        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "statement");
        assert_eq!(json["variant"], "warning");
        assert_eq!(json["order"], 3);
        assert_eq!(json["metadata"]["quality_score"], 72);
        assert!(json["metadata"]["image_prompt"].is_null());
    }

    #[test]
    fn test_block_ids_unique() {
        let body = BlockBody::Divider {
            label: None,
            color: DividerColor::Teal,
        };
        let a = ContentBlock::new(0, body.clone(), BlockMetadata::scaffolding());
        let b = ContentBlock::new(1, body, BlockMetadata::scaffolding());
        assert_ne!(a.id, b.id);
    }
}
