//! Domain model for the subject catalog and the timeline.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every subject is identified by a stable `SubjectId`.
//! - Timeline slots reference subjects by id or are breaks; never by name.

pub mod subject;
pub mod timeline;
