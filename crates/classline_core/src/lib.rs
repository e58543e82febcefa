//! Core domain logic for ClassLine.
//! This crate is the single source of truth for schedule invariants.

pub mod codec;
pub mod derive;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use codec::duration::{format_absolute_time, format_clock, parse_duration, DurationFormatError};
pub use derive::timeline_view::{derive_view, total_duration_sec, InternalConsistencyError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::subject::{NewSubject, Subject, SubjectFieldError, SubjectId};
pub use model::timeline::{Slot, TimelineEntry, TimelineView, BREAK_LABEL};
pub use service::guard::{ReferentialConflictError, TimelineValidationError, MIN_SLOT_DURATION_SEC};
pub use service::schedule_service::{ScheduleError, ScheduleService};
pub use store::snapshot::{Store, SubscriptionId};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
