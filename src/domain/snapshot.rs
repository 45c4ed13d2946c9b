//! Search snapshots: one incremental state of an in-progress search.

use serde::{Deserialize, Serialize};

use crate::domain::item::CombinationRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnapshot {
    pub index: usize,
    pub message: String,
    /// `None` until the search has produced anything to show.
    pub partial_tree: Option<Vec<CombinationRecord>>,
    #[serde(default)]
    pub highlighted_items: Vec<String>,
}

impl SearchSnapshot {
    pub fn not_started(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
            partial_tree: None,
            highlighted_items: Vec::new(),
        }
    }

    pub fn with_tree(
        index: usize,
        message: impl Into<String>,
        records: Vec<CombinationRecord>,
        highlighted_items: Vec<String>,
    ) -> Self {
        Self {
            index,
            message: message.into(),
            partial_tree: Some(records),
            highlighted_items,
        }
    }

    pub fn has_tree(&self) -> bool {
        self.partial_tree.is_some()
    }
}
