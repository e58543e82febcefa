//! Observable state containers.
//!
//! # Responsibility
//! - Provide atomic whole-value replacement for the subject and timeline stores.
//! - Give presentation collaborators a change-notification boundary.

pub mod snapshot;
