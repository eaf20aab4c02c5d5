//! Issue Tracker Service
//!
//! Per-project issue tracking over HTTP. Projects are created on the first
//! issue filed under their name; issues are listed, updated and deleted
//! through `/api/issues/{project}`.

mod api;
mod config;
mod database;
mod domain;
mod dto;
mod error;
mod issues;
mod projects;
mod service;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use api::AppState;
pub use config::Config;
pub use database::{Database, DatabaseError};
pub use domain::{Issue, IssueId, Project, ProjectId};
pub use dto::{
    CreateIssueRequest, DeleteIssueRequest, IssueQuery, MutationResponse, RequestBody, UpdateFields,
    UpdateIssueRequest,
};
pub use error::IssueError;
pub use issues::{IssueChanges, IssueFilter, NewIssue};
pub use service::IssueService;

/// The complete application: issue API under `/api`, health check, request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", api::routes())
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
