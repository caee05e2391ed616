//! Update records decoded from the tracker payload

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of tracking sheet a record targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Animation,
    Render,
    General,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Animation => "animation",
            RecordType::Render => "render",
            RecordType::General => "general",
        }
    }
}

impl FromStr for RecordType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "animation" => Ok(RecordType::Animation),
            "render" => Ok(RecordType::Render),
            // Older tracker hooks still send the Portuguese spelling.
            "general" | "geral" => Ok(RecordType::General),
            other => Err(SyncError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which status column an animation update lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnimationPhase {
    Blocking,
    Polish,
}

impl AnimationPhase {
    fn from_task(task: &str) -> Self {
        if task == "blocking" {
            AnimationPhase::Blocking
        } else {
            AnimationPhase::Polish
        }
    }
}

/// Which column group a render update lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenderPhase {
    Render,
    Comp,
}

impl RenderPhase {
    fn from_task(task: &str) -> Self {
        if task == "render" {
            RenderPhase::Render
        } else {
            RenderPhase::Comp
        }
    }
}

/// Per-type payload, carrying only what that sheet layout writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordKind {
    Animation {
        phase: AnimationPhase,
        status: String,
    },
    Render {
        phase: RenderPhase,
        assignees: String,
        status: String,
        date: String,
    },
    /// `task_type` and `description` are left untouched in the sheet when absent
    General {
        assignees: String,
        status: String,
        task_type: Option<String>,
        description: Option<String>,
    },
}

/// A single shot/task update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRecord {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub shot: String,
    pub task: String,
    pub kind: RecordKind,
}

impl UpdateRecord {
    /// Decode a record from the JSON payload passed on the command line
    pub fn from_json(payload: &str) -> Result<Self> {
        let raw: RawRecord = serde_json::from_str(payload)
            .map_err(|e| SyncError::MalformedInput(e.to_string()))?;
        raw.into_record()
    }

    pub fn record_type(&self) -> RecordType {
        match self.kind {
            RecordKind::Animation { .. } => RecordType::Animation,
            RecordKind::Render { .. } => RecordType::Render,
            RecordKind::General { .. } => RecordType::General,
        }
    }

    pub fn status(&self) -> &str {
        match &self.kind {
            RecordKind::Animation { status, .. }
            | RecordKind::Render { status, .. }
            | RecordKind::General { status, .. } => status,
        }
    }
}

/// Assignees arrive either as a display string or as a list of names
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Assignees {
    One(String),
    Many(Vec<String>),
}

impl Assignees {
    fn joined(self) -> String {
        match self {
            Assignees::One(name) => name,
            Assignees::Many(names) => names.join(", "),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    spreadsheet_id: Option<String>,
    sheet_name: Option<String>,
    #[serde(alias = "type")]
    spreadsheet_type: Option<String>,
    shot: Option<String>,
    task: Option<String>,
    status: Option<String>,
    assignees: Option<Assignees>,
    date: Option<String>,
    task_type: Option<String>,
    description: Option<String>,
}

impl RawRecord {
    fn into_record(self) -> Result<UpdateRecord> {
        // The type is checked first so an unknown type is reported as such
        // even when the rest of the payload is incomplete.
        let record_type: RecordType = required(self.spreadsheet_type, "spreadsheet_type")?.parse()?;

        let spreadsheet_id = required(self.spreadsheet_id, "spreadsheet_id")?;
        let sheet_name = required(self.sheet_name, "sheet_name")?;
        let shot = required(self.shot, "shot")?;
        let task = required(self.task, "task")?;
        let status = required(self.status, "status")?;

        let kind = match record_type {
            RecordType::Animation => RecordKind::Animation {
                phase: AnimationPhase::from_task(&task),
                status,
            },
            RecordType::Render => RecordKind::Render {
                phase: RenderPhase::from_task(&task),
                assignees: required(self.assignees, "assignees")?.joined(),
                status,
                date: required(self.date, "date")?,
            },
            RecordType::General => RecordKind::General {
                assignees: required(self.assignees, "assignees")?.joined(),
                status,
                task_type: self.task_type,
                description: self.description,
            },
        };

        Ok(UpdateRecord {
            spreadsheet_id,
            sheet_name,
            shot,
            task,
            kind,
        })
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| SyncError::MalformedInput(format!("missing required field '{}'", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_record() {
        let record = UpdateRecord::from_json(
            r#"{"spreadsheet_id":"abc","sheet_name":"Shots","spreadsheet_type":"animation",
                "shot":"sh020","task":"blocking","status":"Done"}"#,
        )
        .unwrap();

        assert_eq!(record.record_type(), RecordType::Animation);
        assert_eq!(
            record.kind,
            RecordKind::Animation {
                phase: AnimationPhase::Blocking,
                status: "Done".to_string(),
            }
        );
    }

    #[test]
    fn test_non_blocking_task_is_polish() {
        let record = UpdateRecord::from_json(
            r#"{"spreadsheet_id":"abc","sheet_name":"Shots","spreadsheet_type":"animation",
                "shot":"sh020","task":"spline","status":"WIP"}"#,
        )
        .unwrap();
        assert!(matches!(
            record.kind,
            RecordKind::Animation {
                phase: AnimationPhase::Polish,
                ..
            }
        ));
    }

    #[test]
    fn test_render_requires_assignees_and_date() {
        let err = UpdateRecord::from_json(
            r#"{"spreadsheet_id":"abc","sheet_name":"Render","spreadsheet_type":"render",
                "shot":"sh010","task":"render","status":"Done","date":"2024-05-01"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::MalformedInput(ref m) if m.contains("assignees")));

        let err = UpdateRecord::from_json(
            r#"{"spreadsheet_id":"abc","sheet_name":"Render","spreadsheet_type":"render",
                "shot":"sh010","task":"comp","status":"Done","assignees":"Ana"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::MalformedInput(ref m) if m.contains("date")));
    }

    #[test]
    fn test_assignee_list_is_joined() {
        let record = UpdateRecord::from_json(
            r#"{"spreadsheet_id":"abc","sheet_name":"Render","spreadsheet_type":"render",
                "shot":"sh010","task":"comp","status":"Done",
                "assignees":["Ana","Bruno"],"date":"2024-05-01"}"#,
        )
        .unwrap();
        match record.kind {
            RecordKind::Render {
                phase, assignees, ..
            } => {
                assert_eq!(phase, RenderPhase::Comp);
                assert_eq!(assignees, "Ana, Bruno");
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_general_optional_text_stays_absent() {
        let record = UpdateRecord::from_json(
            r#"{"spreadsheet_id":"abc","sheet_name":"Geral","spreadsheet_type":"geral",
                "shot":"sh010","task":"layout","status":"WIP","assignees":"Ana"}"#,
        )
        .unwrap();
        assert_eq!(record.record_type(), RecordType::General);
        match record.kind {
            RecordKind::General {
                task_type,
                description,
                ..
            } => {
                assert_eq!(task_type, None);
                assert_eq!(description, None);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_reported_before_missing_fields() {
        let err = UpdateRecord::from_json(r#"{"spreadsheet_type":"unknown"}"#).unwrap_err();
        assert!(matches!(err, SyncError::UnknownType(ref t) if t == "unknown"));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = UpdateRecord::from_json("{not json").unwrap_err();
        assert!(matches!(err, SyncError::MalformedInput(_)));

        let err = UpdateRecord::from_json(r#"{"shot":"sh010"}"#).unwrap_err();
        assert!(matches!(err, SyncError::MalformedInput(ref m) if m.contains("spreadsheet_type")));
    }
}
