//! Timeline domain model.
//!
//! # Responsibility
//! - Define one ordered schedule slot and its derived display interval.
//!
//! # Invariants
//! - Stored entries always carry `duration_sec >= 1`.
//! - `Slot::Break` can never collide with a generated subject id.

use crate::model::subject::SubjectId;
use serde::{Deserialize, Serialize};

/// Display label used for break slots.
pub const BREAK_LABEL: &str = "下课";

/// What occupies a timeline slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "subject_id")]
pub enum Slot {
    /// Off period between classes.
    Break,
    /// Reference into the subject catalog.
    Subject(SubjectId),
}

impl Slot {
    /// Returns referenced subject id, `None` for breaks.
    pub fn subject_id(&self) -> Option<SubjectId> {
        match self {
            Self::Break => None,
            Self::Subject(id) => Some(*id),
        }
    }

    pub fn references(&self, subject_id: SubjectId) -> bool {
        self.subject_id() == Some(subject_id)
    }
}

/// One fixed-duration slot in schedule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub slot: Slot,
    pub duration_sec: u64,
}

impl TimelineEntry {
    pub fn new(slot: Slot, duration_sec: u64) -> Self {
        Self { slot, duration_sec }
    }
}

/// Absolute interval computed for one timeline entry.
///
/// `start`/`end` are seconds from the start of the first entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineView {
    pub start: u64,
    pub end: u64,
    pub name: String,
}
