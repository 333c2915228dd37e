//! Administrative action classification.
//!
//! An administrative change-log entry reports its kind through three
//! predicates (change, deletion, addition). Exactly one is expected to hold.
//! When more than one does, the predicates are checked in that order and the
//! last match wins, so addition beats deletion beats change.

use serde::{Deserialize, Serialize};

/// Human labels recorded as the `action` of admin tracking records.
pub mod action_labels {
    pub const CHANGE: &str = "admin updated";
    pub const DELETION: &str = "admin deleted";
    pub const ADDITION: &str = "admin added";
}

/// The kind of an administrative change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminActionKind {
    Change,
    Deletion,
    Addition,
}

impl AdminActionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Change => action_labels::CHANGE,
            Self::Deletion => action_labels::DELETION,
            Self::Addition => action_labels::ADDITION,
        }
    }
}

/// Outcome of classifying one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The winning kind, or `None` if no predicate held.
    pub kind: Option<AdminActionKind>,
    /// How many predicates held.
    pub matched: usize,
}

impl Classification {
    /// Label for the `action` field; empty when no predicate held.
    pub fn label(&self) -> &'static str {
        self.kind.map_or("", AdminActionKind::label)
    }

    /// More than one predicate held and the tie-break decided the kind.
    pub fn is_conflicting(&self) -> bool {
        self.matched > 1
    }
}

/// Classify an entry from its three predicates.
pub fn classify(is_change: bool, is_deletion: bool, is_addition: bool) -> Classification {
    let mut kind = None;
    let mut matched = 0;
    for (holds, candidate) in [
        (is_change, AdminActionKind::Change),
        (is_deletion, AdminActionKind::Deletion),
        (is_addition, AdminActionKind::Addition),
    ] {
        if holds {
            kind = Some(candidate);
            matched += 1;
        }
    }
    Classification { kind, matched }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
