//! Subject domain model.
//!
//! # Responsibility
//! - Define the catalog record for one class/period type.
//! - Normalize creation input into a canonical `Subject`.
//!
//! # Invariants
//! - `id` is generated once and never reused for another subject.
//! - `name` is never blank.
//! - `room`/`teacher` are `None` when unset, never an empty string.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a subject.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type SubjectId = Uuid;

/// Field-level error raised while creating a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectFieldError {
    /// `name` is empty after trim.
    BlankName,
    /// Caller supplied the nil UUID as an explicit id.
    NilId,
}

impl Display for SubjectFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "subject name must not be blank"),
            Self::NilId => write!(f, "subject id must not be nil"),
        }
    }
}

impl Error for SubjectFieldError {}

/// Raw creation input, as collected from a subject form.
///
/// Every field is taken verbatim; normalization happens in `Subject::create`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSubject {
    /// Required display name.
    pub name: String,
    /// Optional abbreviation; falls back to the first character of `name`.
    pub short_name: Option<String>,
    pub room: Option<String>,
    pub teacher: Option<String>,
}

impl NewSubject {
    /// Starts an input with only the required name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn short_name(mut self, value: impl Into<String>) -> Self {
        self.short_name = Some(value.into());
        self
    }

    pub fn room(mut self, value: impl Into<String>) -> Self {
        self.room = Some(value.into());
        self
    }

    pub fn teacher(mut self, value: impl Into<String>) -> Self {
        self.teacher = Some(value.into());
        self
    }
}

/// One class/period type that timeline slots can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub short_name: String,
    pub room: Option<String>,
    pub teacher: Option<String>,
}

impl Subject {
    /// Creates a subject with a freshly generated id.
    ///
    /// # Errors
    /// - `SubjectFieldError::BlankName` when `input.name` is blank after trim.
    pub fn create(input: NewSubject) -> Result<Self, SubjectFieldError> {
        Self::with_id(Uuid::new_v4(), input)
    }

    /// Creates a subject with a caller-provided id.
    ///
    /// For callers that already own a stable id, such as fixtures building
    /// catalogs for `derive_view`. `ScheduleService` and plan replay always go
    /// through `create`, so catalog ids are generated there.
    ///
    /// # Errors
    /// - `SubjectFieldError::NilId` for `Uuid::nil()`.
    /// - `SubjectFieldError::BlankName` when `input.name` is blank after trim.
    pub fn with_id(id: SubjectId, input: NewSubject) -> Result<Self, SubjectFieldError> {
        if id.is_nil() {
            return Err(SubjectFieldError::NilId);
        }

        let name = input.name.trim();
        if name.is_empty() {
            return Err(SubjectFieldError::BlankName);
        }

        let short_name = match normalize_optional(input.short_name) {
            Some(value) => value,
            None => name.chars().take(1).collect(),
        };

        Ok(Self {
            id,
            name: name.to_string(),
            short_name,
            room: normalize_optional(input.room),
            teacher: normalize_optional(input.teacher),
        })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
