//! Domain Models
//!
//! Projects own issues. Identifiers are time-ordered UUIDs and timestamps are
//! UTC with millisecond precision, the resolution they are stored with.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::database::{DatabaseError, IssueRow, ProjectRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectId(Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IssueId(Uuid);

impl IssueId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses a client supplied identifier. `None` means the value can never
    /// name a stored issue.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current time truncated to the stored precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc).trunc_subsecs(3))
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}

impl TryFrom<ProjectRow> for Project {
    type Error = DatabaseError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::InvalidData(format!("project id '{}': {}", row.id, e)))?;
        Ok(Project {
            id: ProjectId(id),
            name: row.name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: IssueId,
    #[serde(skip)]
    pub project_id: ProjectId,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub open: bool,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_on: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_on: DateTime<Utc>,
}

impl TryFrom<IssueRow> for Issue {
    type Error = DatabaseError;

    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        let invalid = |field: &str, value: &str| {
            DatabaseError::InvalidData(format!("issue {} has malformed {}: '{}'", row.id, field, value))
        };

        let id = IssueId::parse(&row.id).ok_or_else(|| invalid("id", &row.id))?;
        let project_id = Uuid::parse_str(&row.project_id)
            .map(ProjectId)
            .map_err(|_| invalid("project_id", &row.project_id))?;
        let created_on = parse_timestamp(&row.created_on).ok_or_else(|| invalid("created_on", &row.created_on))?;
        let updated_on = parse_timestamp(&row.updated_on).ok_or_else(|| invalid("updated_on", &row.updated_on))?;

        Ok(Issue {
            id,
            project_id,
            issue_title: row.issue_title,
            issue_text: row.issue_text,
            created_by: row.created_by,
            assigned_to: row.assigned_to,
            status_text: row.status_text,
            open: row.open,
            created_on,
            updated_on,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_ids_only_accept_uuids() {
        let id = IssueId::new();
        assert_eq!(IssueId::parse(&id.to_string()), Some(id));
        assert_eq!(IssueId::parse("5871dda29faedc3491ff93bb"), None);
        assert_eq!(IssueId::parse(""), None);
    }

    #[test]
    fn timestamps_are_normalized_to_millis() {
        let ts = parse_timestamp("2024-03-01T10:20:30.123456+02:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01T08:20:30.123Z");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn issue_serializes_without_project_id() {
        let created = parse_timestamp("2024-01-01T00:00:00.000Z").unwrap();
        let issue = Issue {
            id: IssueId::new(),
            project_id: ProjectId::new(),
            issue_title: "Broken link".into(),
            issue_text: "Footer link 404s".into(),
            created_by: "joe".into(),
            assigned_to: String::new(),
            status_text: String::new(),
            open: true,
            created_on: created,
            updated_on: created,
        };

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["_id"], issue.id.to_string());
        assert_eq!(json["created_on"], "2024-01-01T00:00:00.000Z");
        assert_eq!(json["open"], true);
        assert!(json.get("project_id").is_none());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn row_with_bad_timestamp_is_invalid_data() {
        let row = IssueRow {
            id: IssueId::new().to_string(),
            project_id: ProjectId::new().to_string(),
            issue_title: "t".into(),
            issue_text: "x".into(),
            created_by: "me".into(),
            assigned_to: String::new(),
            status_text: String::new(),
            open: true,
            created_on: "garbage".into(),
            updated_on: "2024-01-01T00:00:00.000Z".into(),
        };

        assert!(matches!(Issue::try_from(row), Err(DatabaseError::InvalidData(_))));
    }
}
