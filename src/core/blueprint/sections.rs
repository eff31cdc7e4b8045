//! Lesson Sections
//!
//! The blueprint lesson is built from ten fixed sections, always generated
//! in the same order. Each section carries its display title, divider
//! accent, the minimum number of supporting blocks it should reach, and the
//! word range its primary content is scored against.

use serde::{Deserialize, Serialize};

use super::blocks::DividerColor;

/// One of the ten fixed stages of the lesson blueprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Overview,
    Objectives,
    KeyTerms,
    Concept,
    Example,
    Visual,
    Steps,
    Mistakes,
    Practice,
    Summary,
}

impl Section {
    /// All sections in generation order.
    pub const ALL: [Section; 10] = [
        Section::Overview,
        Section::Objectives,
        Section::KeyTerms,
        Section::Concept,
        Section::Example,
        Section::Visual,
        Section::Steps,
        Section::Mistakes,
        Section::Practice,
        Section::Summary,
    ];

    /// Reader-facing section heading.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::Objectives => "Learning Objectives",
            Section::KeyTerms => "Key Terms",
            Section::Concept => "Deep Dive",
            Section::Example => "Worked Examples",
            Section::Visual => "Visual Walkthrough",
            Section::Steps => "Step by Step",
            Section::Mistakes => "Common Mistakes",
            Section::Practice => "Practice",
            Section::Summary => "Summary",
        }
    }

    /// Divider accent color shown after the section.
    pub fn divider_color(&self) -> DividerColor {
        match self {
            Section::Overview => DividerColor::Indigo,
            Section::Objectives => DividerColor::Teal,
            Section::KeyTerms => DividerColor::Amber,
            Section::Concept => DividerColor::Violet,
            Section::Example => DividerColor::Rose,
            Section::Visual => DividerColor::Sky,
            Section::Steps => DividerColor::Emerald,
            Section::Mistakes => DividerColor::Orange,
            Section::Practice => DividerColor::Fuchsia,
            Section::Summary => DividerColor::Slate,
        }
    }

    /// Minimum supporting blocks the pipeline aims for beyond the primary.
    pub fn min_supporting_blocks(&self) -> usize {
        match self {
            Section::Overview => 4,
            Section::Objectives => 4,
            Section::KeyTerms => 5,
            Section::Concept => 6,
            Section::Example => 6,
            Section::Visual => 4,
            Section::Steps => 5,
            Section::Mistakes => 5,
            Section::Practice => 5,
            Section::Summary => 4,
        }
    }

    /// Word range the primary content is expected to land in.
    pub fn ideal_word_range(&self) -> (usize, usize) {
        match self {
            Section::Overview => (80, 200),
            Section::Objectives => (40, 120),
            Section::KeyTerms => (60, 180),
            Section::Concept => (150, 400),
            Section::Example => (100, 300),
            Section::Visual => (40, 120),
            Section::Steps => (80, 250),
            Section::Mistakes => (80, 220),
            Section::Practice => (60, 200),
            Section::Summary => (60, 160),
        }
    }

    /// Sections whose content should lead with observable action verbs.
    pub fn is_action_oriented(&self) -> bool {
        matches!(self, Section::Objectives | Section::Practice)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Section::Overview => "overview",
            Section::Objectives => "objectives",
            Section::KeyTerms => "key-terms",
            Section::Concept => "concept",
            Section::Example => "example",
            Section::Visual => "visual",
            Section::Steps => "steps",
            Section::Mistakes => "mistakes",
            Section::Practice => "practice",
            Section::Summary => "summary",
        };
        write!(f, "{}", s)
    }
}
