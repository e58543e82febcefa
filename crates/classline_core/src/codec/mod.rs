//! Text codecs for user-facing time values.
//!
//! # Responsibility
//! - Convert clock strings typed by users into integer seconds.
//! - Render absolute offsets for display.

pub mod duration;
