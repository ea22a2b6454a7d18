//! Edit modes set by the surrounding UI.

use serde::{Deserialize, Serialize};

/// What a pointer-down on the canvas does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EditMode {
    /// Plain edit mode: select, drag and resize existing marks.
    #[default]
    Select,
    /// Drag out new straight lines. Stays active after each line.
    Line,
    /// Place one score label with the given text, then fall back to `Select`.
    Score { label: String },
}

impl EditMode {
    /// Create a score mode for a label.
    pub fn score(label: impl Into<String>) -> Self {
        EditMode::Score { label: label.into() }
    }

    /// The trimmed pending label, if this is a score mode with usable text.
    pub fn pending_label(&self) -> Option<&str> {
        match self {
            EditMode::Score { label } => Some(label.trim()).filter(|l| !l.is_empty()),
            _ => None,
        }
    }
}
