//! Project Store
//!
//! Projects are created lazily the first time an issue is filed under a name.
//! `projects.name` is `UNIQUE`, so two requests racing to create the same
//! project end with one insert winning and the loser reading the winner's row.

use tracing::{debug, info};

use crate::database::{Database, DatabaseError, ProjectRow, Result};
use crate::domain::{Project, ProjectId};

#[derive(Clone)]
pub struct ProjectStore {
    db: Database,
}

impl ProjectStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Look up a project without creating it.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT id, name FROM projects WHERE name = ?")
            .bind(name)
            .fetch_optional(self.db.pool())
            .await?;

        row.map(Project::try_from).transpose()
    }

    /// Find the project called `name`, creating it when it does not exist yet.
    pub async fn resolve(&self, name: &str) -> Result<Project> {
        if let Some(project) = self.find_by_name(name).await? {
            return Ok(project);
        }

        match self.create(name).await {
            Ok(project) => Ok(project),
            Err(err) if err.is_unique_violation() => {
                debug!(project = name, "Project created concurrently, retrying lookup");
                self.find_by_name(name)
                    .await?
                    .ok_or_else(|| DatabaseError::NotFound(format!("Project '{}' vanished after insert", name)))
            }
            Err(err) => Err(err),
        }
    }

    async fn create(&self, name: &str) -> Result<Project> {
        let project = Project {
            id: ProjectId::new(),
            name: name.to_string(),
        };

        sqlx::query("INSERT INTO projects (id, name) VALUES (?, ?)")
            .bind(project.id.to_string())
            .bind(&project.name)
            .execute(self.db.pool())
            .await?;

        info!(project = name, project_id = %project.id, "Project created");
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> ProjectStore {
        ProjectStore::new(Database::in_memory().await.unwrap())
    }

    async fn project_count(store: &ProjectStore) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(store.db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn find_does_not_create() {
        let store = store().await;

        assert_eq!(store.find_by_name("apitest").await.unwrap(), None);
        assert_eq!(project_count(&store).await, 0);
    }

    #[tokio::test]
    async fn resolve_creates_once_then_reuses() {
        let store = store().await;

        let first = store.resolve("apitest").await.unwrap();
        let second = store.resolve("apitest").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name, "apitest");
        assert_eq!(project_count(&store).await, 1);
        assert_eq!(store.find_by_name("apitest").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn names_are_matched_exactly() {
        let store = store().await;

        let lower = store.resolve("apitest").await.unwrap();
        let upper = store.resolve("ApiTest").await.unwrap();

        assert_ne!(lower.id, upper.id);
        assert_eq!(project_count(&store).await, 2);
    }

    #[tokio::test]
    async fn concurrent_resolve_yields_a_single_project() {
        let store = store().await;

        let (a, b, c) = tokio::join!(
            store.resolve("fresh"),
            store.resolve("fresh"),
            store.resolve("fresh"),
        );

        let a = a.unwrap();
        assert_eq!(a, b.unwrap());
        assert_eq!(a, c.unwrap());
        assert_eq!(project_count(&store).await, 1);
    }
}
