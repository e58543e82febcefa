//! Core use-case services.
//!
//! # Responsibility
//! - Gate every store mutation behind integrity rules.
//! - Keep presentation collaborators decoupled from store internals.

pub mod guard;
pub mod schedule_service;
