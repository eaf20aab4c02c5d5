//! Issue API Handlers
//!
//! - `GET /issues/{project}` - List issues, filtered by query parameters
//! - `POST /issues/{project}` - Create an issue
//! - `PUT /issues/{project}` - Update fields of an issue
//! - `DELETE /issues/{project}` - Delete an issue
//!
//! Every handler answers `200 OK`; failures are reported in the JSON body.

use std::convert::Infallible;

use axum::{
    extract::{rejection::QueryRejection, FromRequest, Path, Query, Request, State},
    http::header::CONTENT_TYPE,
    routing::get,
    Form, Json, Router,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::database::Database;
use crate::domain::Issue;
use crate::dto::{
    CreateIssueRequest, CreateIssueResponse, DeleteIssueRequest, IssueQuery, MutationResponse,
    RequestBody, UpdateIssueRequest, COULD_NOT_CREATE, COULD_NOT_DELETE, COULD_NOT_UPDATE, DELETED, MISSING_ID,
    NO_UPDATE_FIELDS, REQUIRED_FIELDS_MISSING, UPDATED,
};
use crate::error::IssueError;
use crate::service::IssueService;

#[derive(Clone)]
pub struct AppState {
    pub service: IssueService,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            service: IssueService::new(db),
        }
    }
}

/// Request body read as JSON or as an urlencoded form, depending on
/// `Content-Type`. A body that cannot be read, or JSON that is not an object,
/// becomes an empty body.
impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        let parsed = if is_form {
            Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map(|Form(pairs)| RequestBody::from_pairs(pairs))
                .map_err(|rejection| rejection.body_text())
        } else {
            match Json::<Value>::from_request(req, state).await {
                Ok(Json(Value::Object(fields))) => Ok(RequestBody::new(fields)),
                Ok(Json(other)) => Err(format!("expected a JSON object, got {}", other)),
                Err(rejection) => Err(rejection.body_text()),
            }
        };

        Ok(parsed.unwrap_or_else(|reason| {
            debug!(reason = reason.as_str(), "Unreadable request body, treating it as empty");
            RequestBody::default()
        }))
    }
}

/// Log an operation failure at a level matching its kind.
fn log_failure(operation: &str, project: &str, err: &IssueError) {
    if err.is_validation() || err.is_not_found() {
        debug!(operation, project, error = %err, "Issue request rejected");
    } else {
        error!(operation, project, error = %err, "Issue request failed");
    }
}

async fn list_issues(
    State(state): State<AppState>,
    Path(project): Path<String>,
    query: Result<Query<IssueQuery>, QueryRejection>,
) -> Json<Vec<Issue>> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!(project = project.as_str(), error = %rejection, "Malformed issue query");
            return Json(Vec::new());
        }
    };

    let Some(filter) = query.to_filter() else {
        debug!(project = project.as_str(), ?query, "Issue query can match nothing");
        return Json(Vec::new());
    };

    match state.service.list(&project, &filter).await {
        Ok(issues) => Json(issues),
        Err(err) => {
            log_failure("list", &project, &err);
            Json(Vec::new())
        }
    }
}

async fn create_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    body: RequestBody,
) -> Json<CreateIssueResponse> {
    let created = match CreateIssueRequest::from_body(&body) {
        Ok(request) => state.service.create(&project, request).await,
        Err(err) => Err(err),
    };

    match created {
        Ok(issue) => Json(CreateIssueResponse::Created(issue)),
        Err(err) => {
            log_failure("create", &project, &err);
            let error = match err {
                IssueError::MissingRequiredFields => REQUIRED_FIELDS_MISSING,
                _ => COULD_NOT_CREATE,
            };
            Json(CreateIssueResponse::Rejected { error })
        }
    }
}

async fn update_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    body: RequestBody,
) -> Json<MutationResponse> {
    let request = UpdateIssueRequest::from_body(&body);
    let id = request.id.clone().unwrap_or_default();

    let response = match state.service.update(&project, &request).await {
        Ok(_) => MutationResponse::Done { result: UPDATED, id },
        Err(err) => {
            log_failure("update", &project, &err);
            match err {
                IssueError::MissingId => MutationResponse::Rejected { error: MISSING_ID },
                IssueError::NoUpdateFields => MutationResponse::Failed {
                    error: NO_UPDATE_FIELDS,
                    id,
                },
                _ => MutationResponse::Failed {
                    error: COULD_NOT_UPDATE,
                    id,
                },
            }
        }
    };

    Json(response)
}

async fn delete_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    body: RequestBody,
) -> Json<MutationResponse> {
    let request = DeleteIssueRequest::from_body(&body);
    let id = request.id.clone().unwrap_or_default();

    let response = match state.service.delete(&project, &request).await {
        Ok(_) => MutationResponse::Done { result: DELETED, id },
        Err(err) => {
            log_failure("delete", &project, &err);
            match err {
                IssueError::MissingId => MutationResponse::Rejected { error: MISSING_ID },
                _ => MutationResponse::Failed {
                    error: COULD_NOT_DELETE,
                    id,
                },
            }
        }
    };

    Json(response)
}

/// Build the API routes
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/issues/{project}",
        get(list_issues)
            .post(create_issue)
            .put(update_issue)
            .delete(delete_issue),
    )
}
