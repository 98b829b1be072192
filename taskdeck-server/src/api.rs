//! HTTP surface: shared state, router and request handlers.
//!
//! Handlers are thin: they extract the requester and the payload, call the
//! [`TaskService`] or the [`DashboardAggregator`], and wrap the result in
//! the response shapes of [`taskdeck_proto::api`].

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderName, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use taskdeck_proto::api::{
    CreateTaskRequest, MessageBody, TaskListQuery, TaskListResponse, TaskMessage, TaskView,
    UpdateChecklistRequest, UpdateStatusRequest, UpdateTaskRequest, UpdatedTaskMessage,
};
use taskdeck_proto::dashboard::DashboardData;
use taskdeck_proto::task::TaskId;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{ConfigError, ServerConfig};
use crate::dashboard::{DashboardAggregator, DashboardScope};
use crate::error::ApiError;
use crate::service::{TaskError, TaskService};
use crate::store::TaskStore;
use crate::users::{Requester, UserDirectory};

/// Default maximum accepted request body size (1 MiB).
const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default header carrying the authenticated user id.
const DEFAULT_USER_HEADER: &str = "x-user-id";

/// Shared server state.
pub struct AppState {
    /// Task operations.
    pub tasks: TaskService,
    /// Dashboard summaries.
    pub dashboard: DashboardAggregator,
    /// Known users.
    pub users: Arc<UserDirectory>,
    user_header: HeaderName,
    max_body_size: usize,
}

impl AppState {
    /// Creates state over the given store and directory with default limits.
    #[must_use]
    pub fn new(store: TaskStore, users: UserDirectory) -> Self {
        let store = Arc::new(store);
        let users = Arc::new(users);
        Self {
            tasks: TaskService::new(Arc::clone(&store), Arc::clone(&users)),
            dashboard: DashboardAggregator::new(store),
            users,
            user_header: HeaderName::from_static(DEFAULT_USER_HEADER),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Creates state with the limits and identity header of a resolved
    /// [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUserHeader`] if the configured header
    /// name is invalid.
    pub fn with_config(
        store: TaskStore,
        users: UserDirectory,
        config: &ServerConfig,
    ) -> Result<Self, ConfigError> {
        let user_header = config.user_header_name()?;
        Ok(Self {
            user_header,
            max_body_size: config.max_body_size,
            ..Self::new(store, users)
        })
    }

    /// Header carrying the authenticated user id.
    #[must_use]
    pub const fn user_header(&self) -> &HeaderName {
        &self.user_header
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let max_body_size = state.max_body_size;
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/status", put(update_task_status))
        .route("/tasks/{id}/checklist", put(update_task_checklist))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/user", get(user_dashboard))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the server on the given address with empty state and returns the
/// bound address and a join handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let state = AppState::new(TaskStore::new(), UserDirectory::default());
    start_server_with_state(addr, Arc::new(state)).await
}

/// Starts the server with a pre-configured [`AppState`].
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<AppState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Parses a task id from the path. Malformed ids cannot name a task.
fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse().map_err(|_| ApiError::Task(TaskError::NotFound))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /tasks
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    query: Result<Query<TaskListQuery>, QueryRejection>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.tasks.list(query.status, &requester).await))
}

/// GET /tasks/{id}
async fn get_task(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<Json<TaskView>, ApiError> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.tasks.get(&id, &requester).await?))
}

/// POST /tasks
async fn create_task(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskMessage>), ApiError> {
    let Json(req) = body?;
    let task = state.tasks.create(req, &requester).await?;
    Ok((
        StatusCode::CREATED,
        Json(TaskMessage {
            message: "Task created successfully".to_string(),
            task,
        }),
    ))
}

/// PUT /tasks/{id}
async fn update_task(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<UpdatedTaskMessage>, ApiError> {
    let id = parse_task_id(&id)?;
    let Json(req) = body?;
    let updated_task = state.tasks.update(&id, req, &requester).await?;
    Ok(Json(UpdatedTaskMessage {
        message: "Task updated successfully".to_string(),
        updated_task,
    }))
}

/// DELETE /tasks/{id}
async fn delete_task(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let id = parse_task_id(&id)?;
    state.tasks.delete(&id, &requester).await?;
    Ok(Json(MessageBody::new("Task deleted successfully")))
}

/// PUT /tasks/{id}/status
async fn update_task_status(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<TaskMessage>, ApiError> {
    let id = parse_task_id(&id)?;
    let Json(req) = body?;
    let task = state.tasks.update_status(&id, req.status, &requester).await?;
    Ok(Json(TaskMessage {
        message: "Status updated".to_string(),
        task,
    }))
}

/// PUT /tasks/{id}/checklist
async fn update_task_checklist(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
    body: Result<Json<UpdateChecklistRequest>, JsonRejection>,
) -> Result<Json<TaskMessage>, ApiError> {
    let id = parse_task_id(&id)?;
    let Json(req) = body?;
    let task = state
        .tasks
        .update_checklist(&id, req.todo_checklist, &requester)
        .await?;
    Ok(Json(TaskMessage {
        message: "Checklist updated".to_string(),
        task,
    }))
}

/// GET /dashboard
async fn dashboard(
    State(state): State<Arc<AppState>>,
    requester: Requester,
) -> Result<Json<DashboardData>, ApiError> {
    if !requester.is_admin() {
        tracing::warn!(requester = %requester.id, "global dashboard refused");
        return Err(ApiError::AdminOnly);
    }
    let data = state
        .dashboard
        .summarize(&DashboardScope::Global, Utc::now())
        .await;
    Ok(Json(data))
}

/// GET /dashboard/user
async fn user_dashboard(
    State(state): State<Arc<AppState>>,
    requester: Requester,
) -> Json<DashboardData> {
    let scope = DashboardScope::AssignedTo(requester.id);
    Json(state.dashboard.summarize(&scope, Utc::now()).await)
}
