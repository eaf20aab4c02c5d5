//! Wire types for `/api/issues/{project}`.
//!
//! Request bodies keep every field optional so that missing input surfaces as
//! a structured error body instead of an extractor rejection. `_id` is read
//! from the raw body first, so a malformed field never hides a sent `_id`.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::{parse_timestamp, Issue, IssueId};
use crate::error::IssueError;
use crate::issues::{IssueChanges, IssueFilter, NewIssue};

pub const REQUIRED_FIELDS_MISSING: &str = "required field(s) missing";
pub const MISSING_ID: &str = "missing _id";
pub const NO_UPDATE_FIELDS: &str = "no update field(s) sent";
pub const COULD_NOT_CREATE: &str = "could not create";
pub const COULD_NOT_UPDATE: &str = "could not update";
pub const COULD_NOT_DELETE: &str = "could not delete";
pub const UPDATED: &str = "successfully updated";
pub const DELETED: &str = "successfully deleted";

/// `open` arrives as a JSON boolean or, from HTML forms, as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(value)) => Ok(Some(value)),
        Some(Flag::Text(text)) => match text.as_str() {
            "" => Ok(None),
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!("invalid value for open: '{}'", other))),
        },
    }
}

/// Empty strings count as "not sent".
fn sent(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateIssueRequest {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
}

impl CreateIssueRequest {
    pub fn from_body(body: &RequestBody) -> Result<Self, IssueError> {
        body.parse().map_err(|e| IssueError::InvalidField(e.to_string()))
    }

    /// `None` when any required field is absent or empty.
    pub fn into_new_issue(self) -> Option<NewIssue> {
        Some(NewIssue {
            issue_title: sent(self.issue_title)?,
            issue_text: sent(self.issue_text)?,
            created_by: sent(self.created_by)?,
            assigned_to: self.assigned_to.unwrap_or_default(),
            status_text: self.status_text.unwrap_or_default(),
        })
    }
}

/// A request body as sent, before any field is type checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBody(Map<String, Value>);

impl RequestBody {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Urlencoded form pairs; a repeated key keeps its last value.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(pairs.into_iter().map(|(key, value)| (key, Value::String(value))).collect())
    }

    /// `_id` exactly as sent. Non-string values are kept as their JSON text
    /// so they fail identifier validation instead of looking absent.
    pub fn id(&self) -> Option<String> {
        match self.0.get("_id")? {
            Value::Null => None,
            Value::String(id) => Some(id.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }
}

/// Updatable fields of a PUT body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFields {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub open: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UpdateIssueRequest {
    pub id: Option<String>,
    /// The remaining fields, or why they could not be read.
    pub fields: Result<UpdateFields, String>,
}

impl Default for UpdateIssueRequest {
    fn default() -> Self {
        Self {
            id: None,
            fields: Ok(UpdateFields::default()),
        }
    }
}

impl UpdateIssueRequest {
    pub fn from_body(body: &RequestBody) -> Self {
        Self {
            id: body.id(),
            fields: body.parse::<UpdateFields>().map_err(|e| e.to_string()),
        }
    }

    pub fn changes(&self) -> Result<IssueChanges, IssueError> {
        let fields = self
            .fields
            .as_ref()
            .map_err(|reason| IssueError::InvalidField(reason.clone()))?;

        Ok(IssueChanges {
            issue_title: sent(fields.issue_title.clone()),
            issue_text: sent(fields.issue_text.clone()),
            created_by: sent(fields.created_by.clone()),
            assigned_to: sent(fields.assigned_to.clone()),
            status_text: sent(fields.status_text.clone()),
            open: fields.open,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteIssueRequest {
    pub id: Option<String>,
}

impl DeleteIssueRequest {
    pub fn from_body(body: &RequestBody) -> Self {
        Self { id: body.id() }
    }
}

/// Query string of `GET /api/issues/{project}`. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueQuery {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<String>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
}

impl IssueQuery {
    /// Coerce the raw parameters. `None` when a value can never match a
    /// stored issue (an `_id` that is not a UUID, an unparseable timestamp).
    pub fn to_filter(&self) -> Option<IssueFilter> {
        let id = match &self.id {
            Some(raw) => Some(IssueId::parse(raw)?),
            None => None,
        };
        let created_on = match &self.created_on {
            Some(raw) => Some(parse_timestamp(raw)?),
            None => None,
        };
        let updated_on = match &self.updated_on {
            Some(raw) => Some(parse_timestamp(raw)?),
            None => None,
        };

        Some(IssueFilter {
            id,
            issue_title: self.issue_title.clone(),
            issue_text: self.issue_text.clone(),
            created_by: self.created_by.clone(),
            assigned_to: self.assigned_to.clone(),
            status_text: self.status_text.clone(),
            open: self.open.as_deref().map(|open| open == "true"),
            created_on,
            updated_on,
        })
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CreateIssueResponse {
    Created(Issue),
    Rejected { error: &'static str },
}

/// Body of PUT and DELETE responses.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MutationResponse {
    Done {
        result: &'static str,
        #[serde(rename = "_id")]
        id: String,
    },
    Failed {
        error: &'static str,
        #[serde(rename = "_id")]
        id: String,
    },
    Rejected {
        error: &'static str,
    },
}
