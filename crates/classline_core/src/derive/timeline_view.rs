//! Timeline view derivation.
//!
//! # Responsibility
//! - Fold relative slot durations into absolute display intervals.
//!
//! # Invariants
//! - `view[0].start == 0` and `view[i].end == view[i + 1].start`.
//! - Unresolvable subject references are surfaced, never dropped.
//! - Offsets never wrap or clamp; overflow is surfaced like a dangling id.

use crate::codec::duration::format_absolute_time;
use crate::model::subject::{Subject, SubjectId};
use crate::model::timeline::{Slot, TimelineEntry, TimelineView, BREAK_LABEL};
use log::error;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Timeline state the integrity guard should have made impossible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalConsistencyError {
    /// Entry references a subject missing from the catalog.
    DanglingSubject {
        entry_index: usize,
        subject_id: SubjectId,
    },
    /// Entry `end` does not fit into `u64` seconds.
    OffsetOverflow { entry_index: usize },
}

impl Display for InternalConsistencyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingSubject {
                entry_index,
                subject_id,
            } => write!(
                f,
                "timeline entry {entry_index} references unknown subject {subject_id}"
            ),
            Self::OffsetOverflow { entry_index } => {
                write!(f, "timeline entry {entry_index} ends past the last representable second")
            }
        }
    }
}

impl Error for InternalConsistencyError {}

/// Derives absolute intervals for `timeline` using names from `subjects`.
///
/// # Errors
/// - `DanglingSubject` for the first entry whose subject id does not resolve.
/// - `OffsetOverflow` when a running `end` exceeds `u64::MAX`.
///
/// No partial view is returned.
pub fn derive_view(
    timeline: &[TimelineEntry],
    subjects: &[Subject],
) -> Result<Vec<TimelineView>, InternalConsistencyError> {
    let names = subjects
        .iter()
        .map(|subject| (subject.id, subject.name.as_str()))
        .collect::<HashMap<_, _>>();

    let mut views = Vec::with_capacity(timeline.len());
    let mut start = 0_u64;
    for (entry_index, entry) in timeline.iter().enumerate() {
        let name = match entry.slot {
            Slot::Break => BREAK_LABEL,
            Slot::Subject(subject_id) => match names.get(&subject_id) {
                Some(name) => *name,
                None => {
                    error!(
                        "event=timeline_derive module=derive status=error reason=dangling_subject entry_index={} subject_id={}",
                        entry_index, subject_id
                    );
                    return Err(InternalConsistencyError::DanglingSubject {
                        entry_index,
                        subject_id,
                    });
                }
            },
        };

        let Some(end) = start.checked_add(entry.duration_sec) else {
            error!(
                "event=timeline_derive module=derive status=error reason=offset_overflow entry_index={entry_index}"
            );
            return Err(InternalConsistencyError::OffsetOverflow { entry_index });
        };
        views.push(TimelineView {
            start,
            end,
            name: name.to_string(),
        });
        start = end;
    }

    Ok(views)
}

/// Sums slot durations; equals the last derived `end`.
///
/// Returns `None` when the sum does not fit into `u64`.
pub fn total_duration_sec(timeline: &[TimelineEntry]) -> Option<u64> {
    timeline
        .iter()
        .try_fold(0_u64, |acc, entry| acc.checked_add(entry.duration_sec))
}

impl TimelineView {
    /// Renders `第 d 天 HH:MM:SS => 第 d 天 HH:MM:SS` for this interval.
    pub fn display_range(&self) -> String {
        format!(
            "{} => {}",
            format_absolute_time(self.start),
            format_absolute_time(self.end)
        )
    }

    /// Zero for hand-built views whose `end` precedes `start`.
    pub fn duration_sec(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}
