//! Issue Service
//!
//! Orchestration layer between the HTTP handlers and the stores. Owns the
//! validation order of every operation; the handlers only shape responses.

use tracing::info;

use crate::database::Database;
use crate::domain::{Issue, IssueId};
use crate::dto::{CreateIssueRequest, DeleteIssueRequest, UpdateIssueRequest};
use crate::error::{IssueError, Result};
use crate::issues::{IssueFilter, IssueStore};
use crate::projects::ProjectStore;

#[derive(Clone)]
pub struct IssueService {
    projects: ProjectStore,
    issues: IssueStore,
}

/// A present, non-empty `_id`, or `MissingId`.
fn require_id(raw: Option<&str>) -> Result<&str> {
    raw.filter(|id| !id.is_empty()).ok_or(IssueError::MissingId)
}

fn parse_id(raw: &str) -> Result<IssueId> {
    IssueId::parse(raw).ok_or_else(|| IssueError::InvalidId(raw.to_string()))
}

impl IssueService {
    pub fn new(db: Database) -> Self {
        Self {
            projects: ProjectStore::new(db.clone()),
            issues: IssueStore::new(db),
        }
    }

    /// File a new issue, creating the project on first use.
    pub async fn create(&self, project: &str, request: CreateIssueRequest) -> Result<Issue> {
        let new_issue = request.into_new_issue().ok_or(IssueError::MissingRequiredFields)?;

        let project = self.projects.resolve(project).await?;
        let issue = self.issues.create(project.id, new_issue).await?;

        info!(project = project.name.as_str(), issue_id = %issue.id, "Issue created");
        Ok(issue)
    }

    /// Issues of `project` matching `filter`. An unknown project has no issues.
    pub async fn list(&self, project: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        match self.projects.find_by_name(project).await? {
            Some(project) => Ok(self.issues.list(project.id, filter).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn update(&self, project: &str, request: &UpdateIssueRequest) -> Result<IssueId> {
        let id = parse_id(require_id(request.id.as_deref())?)?;

        let changes = request.changes()?;
        if changes.is_empty() {
            return Err(IssueError::NoUpdateFields);
        }

        let project = self
            .projects
            .find_by_name(project)
            .await?
            .ok_or_else(|| IssueError::ProjectNotFound(project.to_string()))?;

        if !self.issues.update(project.id, id, &changes).await? {
            return Err(IssueError::IssueNotFound(id));
        }

        info!(project = project.name.as_str(), issue_id = %id, "Issue updated");
        Ok(id)
    }

    pub async fn delete(&self, project: &str, request: &DeleteIssueRequest) -> Result<IssueId> {
        let id = parse_id(require_id(request.id.as_deref())?)?;

        let project = self
            .projects
            .find_by_name(project)
            .await?
            .ok_or_else(|| IssueError::ProjectNotFound(project.to_string()))?;

        if !self.issues.delete(project.id, id).await? {
            return Err(IssueError::IssueNotFound(id));
        }

        info!(project = project.name.as_str(), issue_id = %id, "Issue deleted");
        Ok(id)
    }
}
