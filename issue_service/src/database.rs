//! Database Infrastructure Layer
//!
//! Handles the SQLite connection, schema initialization, and the row types
//! used to map between database rows and domain models.
//!
//! This layer is responsible ONLY for database concerns - no business logic.

use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("Database query error: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl DatabaseError {
    /// True when the statement tripped a `UNIQUE` constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Query(sqlx::Error::Database(err)) => err.is_unique_violation(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IssueRow {
    pub id: String,
    pub project_id: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub open: bool,
    pub created_on: String,
    pub updated_on: String,
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let database_config = SqliteConnectOptions::from_str(database_url)
            .map_err(DatabaseError::Connection)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePool::connect_lazy_with(database_config);

        let db = Self { pool };
        db.initialize_tables().await?;

        info!(database = database_url, "Database initialized");
        Ok(db)
    }

    /// Private in-memory database. Pinned to a single connection because every
    /// SQLite `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(DatabaseError::Connection)?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_lazy_with(options);

        let db = Self { pool };
        db.initialize_tables().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn initialize_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS issues (
                id TEXT PRIMARY KEY NOT NULL,
                project_id TEXT NOT NULL,
                issue_title TEXT NOT NULL,
                issue_text TEXT NOT NULL,
                created_by TEXT NOT NULL,
                assigned_to TEXT NOT NULL DEFAULT '',
                status_text TEXT NOT NULL DEFAULT '',
                open INTEGER NOT NULL DEFAULT 1,
                created_on TEXT NOT NULL,
                updated_on TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_issues_project_id ON issues(project_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.initialize_tables().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(tables, vec!["issues".to_string(), "projects".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_project_name_is_a_unique_violation() {
        let db = Database::in_memory().await.unwrap();

        sqlx::query("INSERT INTO projects (id, name) VALUES ('a', 'apitest')")
            .execute(db.pool())
            .await
            .unwrap();

        let err: DatabaseError = sqlx::query("INSERT INTO projects (id, name) VALUES ('b', 'apitest')")
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();

        assert!(err.is_unique_violation());
        assert!(!DatabaseError::InvalidData("x".into()).is_unique_violation());
    }

    #[tokio::test]
    async fn issues_require_an_existing_project() {
        let db = Database::in_memory().await.unwrap();

        let result = sqlx::query(
            r#"
            INSERT INTO issues (id, project_id, issue_title, issue_text, created_by, created_on, updated_on)
            VALUES ('i', 'missing', 't', 'x', 'me', 'now', 'now')
            "#,
        )
        .execute(db.pool())
        .await;

        assert!(result.is_err());
    }
}
