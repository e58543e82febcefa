//! Integrity rules checked before every store mutation.
//!
//! # Responsibility
//! - Decide whether a mutation is allowed against the current snapshots.
//! - Compute the next store value without touching the current one.
//!
//! # Invariants
//! - A subject is never removed while a timeline entry references it.
//! - Stored timeline entries always have `duration_sec >= 1` and a resolvable slot.
//! - Timeline entries are only appended or suffix-truncated.

use crate::derive::timeline_view::total_duration_sec;
use crate::model::subject::{Subject, SubjectId};
use crate::model::timeline::{Slot, TimelineEntry};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Shortest duration accepted for a stored slot.
pub const MIN_SLOT_DURATION_SEC: u64 = 1;

/// Rejected timeline entry input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineValidationError {
    /// Duration is below `MIN_SLOT_DURATION_SEC`.
    DurationTooShort(u64),
    /// Slot references a subject missing from the catalog.
    SubjectNotFound(SubjectId),
    /// Appending would push the last `end` past `u64::MAX` seconds.
    TimelineTooLong { total_sec: u64, duration_sec: u64 },
}

impl Display for TimelineValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DurationTooShort(value) => write!(
                f,
                "slot duration must be at least {MIN_SLOT_DURATION_SEC} second(s), got {value}"
            ),
            Self::SubjectNotFound(id) => write!(f, "subject does not exist: {id}"),
            Self::TimelineTooLong {
                total_sec,
                duration_sec,
            } => write!(
                f,
                "slot of {duration_sec}s does not fit after {total_sec}s of timeline"
            ),
        }
    }
}

impl Error for TimelineValidationError {}

/// Deletion refused because the subject is still scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferentialConflictError {
    pub subject_id: SubjectId,
    /// Number of timeline entries still referencing the subject.
    pub references: usize,
}

impl Display for ReferentialConflictError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "subject {} is referenced by {} timeline entr{}; remove them first",
            self.subject_id,
            self.references,
            if self.references == 1 { "y" } else { "ies" }
        )
    }
}

impl Error for ReferentialConflictError {}

/// Returns the subject catalog with `subject` appended.
pub fn with_subject(subjects: &[Subject], subject: Subject) -> Vec<Subject> {
    let mut next = Vec::with_capacity(subjects.len() + 1);
    next.extend_from_slice(subjects);
    next.push(subject);
    next
}

/// Returns the catalog without `subject_id`, or `None` when it is absent.
///
/// # Errors
/// - `ReferentialConflictError` when any timeline entry references the subject.
pub fn without_subject(
    subjects: &[Subject],
    timeline: &[TimelineEntry],
    subject_id: SubjectId,
) -> Result<Option<(Vec<Subject>, Subject)>, ReferentialConflictError> {
    let references = timeline
        .iter()
        .filter(|entry| entry.slot.references(subject_id))
        .count();
    if references > 0 {
        return Err(ReferentialConflictError {
            subject_id,
            references,
        });
    }

    let Some(position) = subjects.iter().position(|subject| subject.id == subject_id) else {
        return Ok(None);
    };

    let mut next = subjects.to_vec();
    let removed = next.remove(position);
    Ok(Some((next, removed)))
}

/// Validates one slot against the catalog and the current timeline.
///
/// # Errors
/// - `DurationTooShort` when `duration_sec` is zero.
/// - `SubjectNotFound` when `slot` names an unknown subject.
/// - `TimelineTooLong` when the running total would overflow.
pub fn check_entry(
    subjects: &[Subject],
    timeline: &[TimelineEntry],
    slot: Slot,
    duration_sec: u64,
) -> Result<TimelineEntry, TimelineValidationError> {
    if duration_sec < MIN_SLOT_DURATION_SEC {
        return Err(TimelineValidationError::DurationTooShort(duration_sec));
    }
    if let Slot::Subject(subject_id) = slot {
        if !subjects.iter().any(|subject| subject.id == subject_id) {
            return Err(TimelineValidationError::SubjectNotFound(subject_id));
        }
    }
    // Guarded timelines always have a total; a hand-built one may not.
    let total_sec = total_duration_sec(timeline).unwrap_or(u64::MAX);
    if total_sec.checked_add(duration_sec).is_none() {
        return Err(TimelineValidationError::TimelineTooLong {
            total_sec,
            duration_sec,
        });
    }
    Ok(TimelineEntry::new(slot, duration_sec))
}

/// Returns the timeline with `entry` appended at the end.
pub fn with_entry(timeline: &[TimelineEntry], entry: TimelineEntry) -> Vec<TimelineEntry> {
    let mut next = Vec::with_capacity(timeline.len() + 1);
    next.extend_from_slice(timeline);
    next.push(entry);
    next
}

/// Returns the entries strictly before `index`.
///
/// Any `index >= timeline.len()` keeps the whole timeline.
pub fn truncated(timeline: &[TimelineEntry], index: usize) -> Vec<TimelineEntry> {
    timeline[..index.min(timeline.len())].to_vec()
}
