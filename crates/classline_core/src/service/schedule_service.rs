//! Schedule use-case service.
//!
//! # Responsibility
//! - Own the subject and timeline stores for one application instance.
//! - Route every mutation through the integrity guard.
//! - Serve derived timeline views from consistent snapshots.
//!
//! # Invariants
//! - Mutations are serialized by one writer lock spanning both stores.
//! - `derive_view` reads both snapshots under the same lock.
//! - Change notifications are delivered in replacement order.
//! - Rejected mutations leave both stores untouched.

use crate::codec::duration::DurationFormatError;
use crate::derive::timeline_view::{derive_view, InternalConsistencyError};
use crate::model::subject::{NewSubject, Subject, SubjectFieldError, SubjectId};
use crate::model::timeline::{Slot, TimelineEntry, TimelineView};
use crate::service::guard::{self, ReferentialConflictError, TimelineValidationError};
use crate::store::snapshot::{Store, SubscriptionId};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

/// Umbrella error for callers that drive several schedule operations.
#[derive(Debug)]
pub enum ScheduleError {
    Field(SubjectFieldError),
    Format(DurationFormatError),
    Validation(TimelineValidationError),
    Conflict(ReferentialConflictError),
    Internal(InternalConsistencyError),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(err) => write!(f, "{err}"),
            Self::Format(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(err) => write!(f, "{err}"),
            Self::Internal(err) => write!(f, "internal consistency error: {err}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Field(err) => Some(err),
            Self::Format(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Conflict(err) => Some(err),
            Self::Internal(err) => Some(err),
        }
    }
}

impl From<SubjectFieldError> for ScheduleError {
    fn from(value: SubjectFieldError) -> Self {
        Self::Field(value)
    }
}

impl From<DurationFormatError> for ScheduleError {
    fn from(value: DurationFormatError) -> Self {
        Self::Format(value)
    }
}

impl From<TimelineValidationError> for ScheduleError {
    fn from(value: TimelineValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ReferentialConflictError> for ScheduleError {
    fn from(value: ReferentialConflictError) -> Self {
        Self::Conflict(value)
    }
}

impl From<InternalConsistencyError> for ScheduleError {
    fn from(value: InternalConsistencyError) -> Self {
        Self::Internal(value)
    }
}

/// Top-level application state: subject catalog plus ordered timeline.
#[derive(Default)]
pub struct ScheduleService {
    subjects: Store<Vec<Subject>>,
    timeline: Store<Vec<TimelineEntry>>,
    writer: Mutex<()>,
}

impl std::fmt::Debug for ScheduleService {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleService")
            .field("subjects", &self.subjects.get().len())
            .field("timeline", &self.timeline.get().len())
            .finish()
    }
}

impl ScheduleService {
    /// Creates a service with empty stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current subject catalog snapshot.
    pub fn subjects(&self) -> Arc<Vec<Subject>> {
        self.subjects.get()
    }

    /// Returns the current timeline snapshot.
    pub fn timeline(&self) -> Arc<Vec<TimelineEntry>> {
        self.timeline.get()
    }

    pub fn subject(&self, id: SubjectId) -> Option<Subject> {
        self.subjects
            .get()
            .iter()
            .find(|subject| subject.id == id)
            .cloned()
    }

    /// Creates a subject and appends it to the catalog.
    ///
    /// # Errors
    /// - `SubjectFieldError::BlankName` when the trimmed name is empty; the
    ///   catalog is not modified.
    pub fn add_subject(&self, input: NewSubject) -> Result<Subject, SubjectFieldError> {
        let subject = Subject::create(input).inspect_err(|err| {
            warn!("event=subject_add module=schedule status=rejected reason={err}");
        })?;

        let subject_count = {
            let _writer = self.lock_writer();
            let current = self.subjects.get();
            self.subjects
                .replace(guard::with_subject(&current, subject.clone()))
                .len()
        };
        self.subjects.notify();
        info!(
            "event=subject_add module=schedule status=ok subject_id={} subject_count={}",
            subject.id, subject_count
        );
        Ok(subject)
    }

    /// Removes an unreferenced subject.
    ///
    /// Returns the removed subject, or `None` when `id` is not in the catalog.
    ///
    /// # Errors
    /// - `ReferentialConflictError` while any timeline entry references `id`;
    ///   dependent entries must be truncated away first.
    pub fn delete_subject(
        &self,
        id: SubjectId,
    ) -> Result<Option<Subject>, ReferentialConflictError> {
        let outcome = {
            let _writer = self.lock_writer();
            let subjects = self.subjects.get();
            let timeline = self.timeline.get();
            guard::without_subject(&subjects, &timeline, id)
                .map(|found| {
                    found.map(|(next, removed)| {
                        self.subjects.replace(next);
                        removed
                    })
                })
        };

        match outcome {
            Ok(Some(removed)) => {
                self.subjects.notify();
                info!("event=subject_delete module=schedule status=ok subject_id={id}");
                Ok(Some(removed))
            }
            Ok(None) => {
                info!("event=subject_delete module=schedule status=noop subject_id={id}");
                Ok(None)
            }
            Err(err) => {
                warn!(
                    "event=subject_delete module=schedule status=rejected reason=referenced subject_id={} references={}",
                    id, err.references
                );
                Err(err)
            }
        }
    }

    /// Appends one slot to the end of the timeline.
    ///
    /// # Errors
    /// - `DurationTooShort` for `duration_sec == 0`.
    /// - `SubjectNotFound` when `slot` names an unknown subject.
    /// - `TimelineTooLong` when the new total would not fit into `u64` seconds.
    pub fn add_timeline_entry(
        &self,
        slot: Slot,
        duration_sec: u64,
    ) -> Result<TimelineEntry, TimelineValidationError> {
        let (entry, snapshot) = {
            let _writer = self.lock_writer();
            let subjects = self.subjects.get();
            let timeline = self.timeline.get();
            let entry = guard::check_entry(&subjects, &timeline, slot, duration_sec)
                .inspect_err(|err| {
                    warn!("event=timeline_add module=schedule status=rejected reason={err}");
                })?;
            (entry, self.timeline.replace(guard::with_entry(&timeline, entry)))
        };
        self.timeline.notify();
        info!(
            "event=timeline_add module=schedule status=ok index={} duration_sec={}",
            snapshot.len() - 1,
            duration_sec
        );
        Ok(entry)
    }

    /// Keeps only entries strictly before `index`.
    ///
    /// Returns the number of removed entries; out-of-range indexes remove none.
    pub fn truncate_timeline(&self, index: usize) -> usize {
        let removed = {
            let _writer = self.lock_writer();
            let timeline = self.timeline.get();
            let next = guard::truncated(&timeline, index);
            let removed = timeline.len() - next.len();
            if removed > 0 {
                self.timeline.replace(next);
            }
            removed
        };
        if removed > 0 {
            self.timeline.notify();
        }
        info!(
            "event=timeline_truncate module=schedule status=ok index={index} removed={removed}"
        );
        removed
    }

    /// Derives absolute intervals for the current timeline.
    ///
    /// # Errors
    /// - `InternalConsistencyError` if a stored entry references a missing
    ///   subject or overflows the running offset. Either indicates a bypassed
    ///   guard and is logged at error level.
    pub fn derive_view(&self) -> Result<Vec<TimelineView>, InternalConsistencyError> {
        let (timeline, subjects) = {
            let _writer = self.lock_writer();
            (self.timeline.get(), self.subjects.get())
        };
        derive_view(&timeline, &subjects)
    }

    /// Registers a callback run after every catalog replacement.
    ///
    /// Callbacks run after the writer lock is released and may read or
    /// mutate the service. Deliveries are serialized and never go back to an
    /// older snapshot; bursts of concurrent writes may be coalesced.
    pub fn on_subjects_changed(
        &self,
        listener: impl Fn(&Vec<Subject>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subjects.subscribe(listener)
    }

    /// Registers a callback run after every timeline replacement.
    pub fn on_timeline_changed(
        &self,
        listener: impl Fn(&Vec<TimelineEntry>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.timeline.subscribe(listener)
    }

    /// Removes a callback registered through either `on_*_changed` method.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subjects.unsubscribe(id) || self.timeline.unsubscribe(id)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
