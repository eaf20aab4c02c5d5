//! Issue Store
//!
//! CRUD over the `issues` table. Every statement is scoped to a project id.
//! Filters and updates only ever touch the columns named in [`IssueFilter`]
//! and [`IssueChanges`]; column names are static, values are always bound.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::database::{Database, IssueRow, Result};
use crate::domain::{self, format_timestamp, Issue, IssueId, ProjectId};

const ISSUE_COLUMNS: &str = "id, project_id, issue_title, issue_text, created_by, \
     assigned_to, status_text, open, created_on, updated_on";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
}

/// Equality constraints for listing issues. `None` fields are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub id: Option<IssueId>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl IssueFilter {
    fn text_columns(&self) -> [(&'static str, Option<&String>); 5] {
        [
            ("issue_title", self.issue_title.as_ref()),
            ("issue_text", self.issue_text.as_ref()),
            ("created_by", self.created_by.as_ref()),
            ("assigned_to", self.assigned_to.as_ref()),
            ("status_text", self.status_text.as_ref()),
        ]
    }
}

/// Fields a client may change on an existing issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueChanges {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
}

impl IssueChanges {
    pub fn is_empty(&self) -> bool {
        self.open.is_none() && self.text_columns().iter().all(|(_, value)| value.is_none())
    }

    fn text_columns(&self) -> [(&'static str, Option<&String>); 5] {
        [
            ("issue_title", self.issue_title.as_ref()),
            ("issue_text", self.issue_text.as_ref()),
            ("created_by", self.created_by.as_ref()),
            ("assigned_to", self.assigned_to.as_ref()),
            ("status_text", self.status_text.as_ref()),
        ]
    }
}

#[derive(Clone)]
pub struct IssueStore {
    db: Database,
}

impl IssueStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, project_id: ProjectId, new: NewIssue) -> Result<Issue> {
        let now = domain::now();
        let issue = Issue {
            id: IssueId::new(),
            project_id,
            issue_title: new.issue_title,
            issue_text: new.issue_text,
            created_by: new.created_by,
            assigned_to: new.assigned_to,
            status_text: new.status_text,
            open: true,
            created_on: now,
            updated_on: now,
        };

        sqlx::query(
            r#"
            INSERT INTO issues (id, project_id, issue_title, issue_text, created_by,
                                assigned_to, status_text, open, created_on, updated_on)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(issue.id.to_string())
        .bind(issue.project_id.to_string())
        .bind(&issue.issue_title)
        .bind(&issue.issue_text)
        .bind(&issue.created_by)
        .bind(&issue.assigned_to)
        .bind(&issue.status_text)
        .bind(issue.open)
        .bind(format_timestamp(&issue.created_on))
        .bind(format_timestamp(&issue.updated_on))
        .execute(self.db.pool())
        .await?;

        Ok(issue)
    }

    /// All issues of `project_id` matching every constraint in `filter`,
    /// oldest first.
    pub async fn list(&self, project_id: ProjectId, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM issues WHERE project_id = ", ISSUE_COLUMNS));
        query.push_bind(project_id.to_string());

        if let Some(id) = filter.id {
            query.push(" AND id = ").push_bind(id.to_string());
        }
        for (column, value) in filter.text_columns() {
            if let Some(value) = value {
                query.push(format!(" AND {} = ", column)).push_bind(value.clone());
            }
        }
        if let Some(open) = filter.open {
            query.push(" AND open = ").push_bind(open);
        }
        if let Some(created_on) = filter.created_on {
            query.push(" AND created_on = ").push_bind(format_timestamp(&created_on));
        }
        if let Some(updated_on) = filter.updated_on {
            query.push(" AND updated_on = ").push_bind(format_timestamp(&updated_on));
        }
        query.push(" ORDER BY created_on, id");

        let rows = query.build_query_as::<IssueRow>().fetch_all(self.db.pool()).await?;

        rows.into_iter().map(Issue::try_from).collect()
    }

    /// Apply `changes` and refresh `updated_on`. Returns `false` when no issue
    /// with `id` exists inside `project_id`.
    pub async fn update(&self, project_id: ProjectId, id: IssueId, changes: &IssueChanges) -> Result<bool> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE issues SET updated_on = ");
        query.push_bind(format_timestamp(&domain::now()));

        for (column, value) in changes.text_columns() {
            if let Some(value) = value {
                query.push(format!(", {} = ", column)).push_bind(value.clone());
            }
        }
        if let Some(open) = changes.open {
            query.push(", open = ").push_bind(open);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(" AND project_id = ")
            .push_bind(project_id.to_string());

        let result = query.build().execute(self.db.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` when no issue with `id` exists inside `project_id`.
    pub async fn delete(&self, project_id: ProjectId, id: IssueId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM issues WHERE id = ? AND project_id = ?")
            .bind(id.to_string())
            .bind(project_id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
