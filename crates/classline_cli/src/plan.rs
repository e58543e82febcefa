//! Plan file replay.
//!
//! # Responsibility
//! - Read a JSON plan describing subjects and timeline slots.
//! - Replay it through `ScheduleService` so every guard rule applies.
//!
//! # Invariants
//! - Timeline items reference subjects by plan-local `key`, never by id.
//! - A missing `subject` key means a break slot.

use classline_core::{
    parse_duration, NewSubject, ScheduleError, ScheduleService, Slot, SubjectId,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    #[serde(default)]
    pub subjects: Vec<PlanSubject>,
    #[serde(default)]
    pub timeline: Vec<PlanSlot>,
    /// Truncates the replayed timeline before this index.
    #[serde(default)]
    pub truncate_at: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanSubject {
    pub key: String,
    pub name: String,
    pub short_name: Option<String>,
    pub room: Option<String>,
    pub teacher: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanSlot {
    pub subject: Option<String>,
    /// `H:MM:SS`.
    pub duration: String,
}

#[derive(Debug)]
pub enum PlanError {
    Io(std::io::Error),
    Json(serde_json::Error),
    DuplicateKey(String),
    UnknownKey { index: usize, key: String },
    Schedule { index: usize, source: ScheduleError },
}

impl Display for PlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read plan: {err}"),
            Self::Json(err) => write!(f, "invalid plan: {err}"),
            Self::DuplicateKey(key) => write!(f, "duplicate subject key `{key}`"),
            Self::UnknownKey { index, key } => {
                write!(f, "timeline item {index}: unknown subject key `{key}`")
            }
            Self::Schedule { index, source } => write!(f, "item {index}: {source}"),
        }
    }
}

impl Error for PlanError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Schedule { source, .. } => Some(source),
            Self::DuplicateKey(_) | Self::UnknownKey { .. } => None,
        }
    }
}

impl Plan {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let raw = std::fs::read_to_string(path).map_err(PlanError::Io)?;
        serde_json::from_str(&raw).map_err(PlanError::Json)
    }

    /// Builds a fresh service holding this plan's subjects and timeline.
    pub fn replay(&self) -> Result<ScheduleService, PlanError> {
        let service = ScheduleService::new();
        let mut ids: HashMap<&str, SubjectId> = HashMap::with_capacity(self.subjects.len());

        for (index, item) in self.subjects.iter().enumerate() {
            if ids.contains_key(item.key.as_str()) {
                return Err(PlanError::DuplicateKey(item.key.clone()));
            }
            let input = NewSubject {
                name: item.name.clone(),
                short_name: item.short_name.clone(),
                room: item.room.clone(),
                teacher: item.teacher.clone(),
            };
            let subject = service
                .add_subject(input)
                .map_err(|err| PlanError::Schedule {
                    index,
                    source: err.into(),
                })?;
            ids.insert(item.key.as_str(), subject.id);
        }

        for (index, item) in self.timeline.iter().enumerate() {
            let slot = match item.subject.as_deref() {
                None => Slot::Break,
                Some(key) => match ids.get(key) {
                    Some(id) => Slot::Subject(*id),
                    None => {
                        return Err(PlanError::UnknownKey {
                            index,
                            key: key.to_string(),
                        })
                    }
                },
            };
            let schedule_err = |source: ScheduleError| PlanError::Schedule { index, source };
            let duration_sec =
                parse_duration(&item.duration).map_err(|err| schedule_err(err.into()))?;
            service
                .add_timeline_entry(slot, duration_sec)
                .map_err(|err| schedule_err(err.into()))?;
        }

        if let Some(index) = self.truncate_at {
            service.truncate_timeline(index);
        }

        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::{Plan, PlanError};
    use classline_core::{ScheduleError, BREAK_LABEL};
    use std::io::Write;

    fn write_plan(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp plan file");
        file.write_all(body.as_bytes()).expect("write plan");
        file
    }

    #[test]
    fn replays_subjects_and_breaks_in_order() {
        let file = write_plan(
            r#"{
                "subjects": [{"key": "zh", "name": "语文", "room": "105"}],
                "timeline": [
                    {"subject": "zh", "duration": "1:00:00"},
                    {"duration": "0:10:00"}
                ]
            }"#,
        );

        let service = Plan::load(file.path()).unwrap().replay().unwrap();
        let view = service.derive_view().unwrap();

        assert_eq!(view.len(), 2);
        assert_eq!(view[0].name, "语文");
        assert_eq!(view[1].name, BREAK_LABEL);
        assert_eq!(view[1].end, 4200);
        assert_eq!(service.subjects()[0].room.as_deref(), Some("105"));
    }

    #[test]
    fn truncate_at_drops_suffix() {
        let file = write_plan(
            r#"{
                "timeline": [
                    {"duration": "0:01:00"},
                    {"duration": "0:02:00"},
                    {"duration": "0:03:00"}
                ],
                "truncate_at": 1
            }"#,
        );

        let service = Plan::load(file.path()).unwrap().replay().unwrap();
        assert_eq!(service.timeline().len(), 1);
    }

    #[test]
    fn reports_unknown_subject_key() {
        let file = write_plan(r#"{"timeline": [{"subject": "fr", "duration": "0:45:00"}]}"#);

        let err = Plan::load(file.path()).unwrap().replay().unwrap_err();
        assert!(matches!(err, PlanError::UnknownKey { index: 0, ref key } if key == "fr"));
    }

    #[test]
    fn reports_bad_duration_with_item_index() {
        let file = write_plan(
            r#"{"timeline": [{"duration": "0:45:00"}, {"duration": "45:00"}]}"#,
        );

        let err = Plan::load(file.path()).unwrap().replay().unwrap_err();
        assert!(matches!(
            err,
            PlanError::Schedule {
                index: 1,
                source: ScheduleError::Format(_)
            }
        ));
    }

    #[test]
    fn reports_zero_duration_as_validation_error() {
        let file = write_plan(r#"{"timeline": [{"duration": "0:00:00"}]}"#);

        let err = Plan::load(file.path()).unwrap().replay().unwrap_err();
        assert!(matches!(
            err,
            PlanError::Schedule {
                source: ScheduleError::Validation(_),
                ..
            }
        ));
    }

    #[test]
    fn rejects_duplicate_keys_and_blank_names() {
        let duplicate = write_plan(
            r#"{"subjects": [{"key": "a", "name": "语文"}, {"key": "a", "name": "数学"}]}"#,
        );
        let err = Plan::load(duplicate.path()).unwrap().replay().unwrap_err();
        assert!(matches!(err, PlanError::DuplicateKey(ref key) if key == "a"));

        let blank = write_plan(r#"{"subjects": [{"key": "a", "name": " "}]}"#);
        let err = Plan::load(blank.path()).unwrap().replay().unwrap_err();
        assert!(matches!(
            err,
            PlanError::Schedule {
                source: ScheduleError::Field(_),
                ..
            }
        ));
    }
}
