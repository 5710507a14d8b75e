//! REST endpoints for message analysis, retrieval, and stats.

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::error::{DatabaseError, PipelineError};
use crate::pipeline::types::RawMessage;
use crate::server::AppState;
use crate::store::{Database as _, RecordFilter};

/// Messages accepted per batch request; the rest are not processed.
const MAX_BATCH_SIZE: usize = 10;

/// Build the API routes.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/v1/health", get(health))
        .route("/api/v1/messages/process", post(process_message))
        .route("/api/v1/messages/batch", post(process_batch))
        .route("/api/v1/messages", get(list_records))
        .route("/api/v1/messages/{id}", get(get_record).delete(delete_record))
        .route("/api/v1/stats", get(stats))
        .with_state(state)
}

// ── Error mapping ───────────────────────────────────────────────────

/// API-level error with an HTTP status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    RateLimited,
    ServiceUnavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Please try again later.".to_string(),
            ),
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while processing your request. Please try again later."
                        .to_string(),
                )
            }
        };
        (status, Json(json!({"error": message, "status": "error"}))).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => Self::BadRequest(msg),
            PipelineError::Service(e) => Self::ServiceUnavailable(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        Self::Internal(err.to_string())
    }
}

// ── Request/response types ──────────────────────────────────────────

/// Message fields as accepted on the wire.
#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default = "default_sender")]
    sender: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    has_attachments: bool,
}

fn default_sender() -> String {
    "unknown@example.com".to_string()
}

impl From<MessagePayload> for RawMessage {
    fn from(payload: MessagePayload) -> Self {
        Self {
            sender: payload.sender,
            subject: payload.subject,
            body: payload.body,
            received_at: payload.received_at,
            has_attachments: payload.has_attachments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProcessRequest {
    #[serde(default)]
    owner_id: String,
    #[serde(flatten)]
    message: MessagePayload,
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    #[serde(default)]
    owner_id: String,
    #[serde(default)]
    messages: Vec<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct OwnerQuery {
    #[serde(default)]
    owner_id: String,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    owner_id: String,
    category: Option<String>,
    is_important: Option<bool>,
}

#[derive(Debug, Serialize)]
struct BatchItem {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<crate::pipeline::AnalysisRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn require_owner(owner_id: &str) -> Result<(), ApiError> {
    if owner_id.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing required field: owner_id".to_string(),
        ));
    }
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "mail-insight API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "description": "Message analysis pipeline with AI-assisted stages",
        "endpoints": {
            "health": "/api/v1/health",
            "process": "/api/v1/messages/process (POST)",
            "batch": "/api/v1/messages/batch (POST)",
            "list": "/api/v1/messages (GET)",
            "get": "/api/v1/messages/{id} (GET)",
            "delete": "/api/v1/messages/{id} (DELETE)",
            "stats": "/api/v1/stats (GET)"
        }
    }))
}

async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if !state.limits.allow_health("health") {
        return Err(ApiError::RateLimited);
    }

    let database = match state.db.record_stats("_health").await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Ok(Json(json!({
        "status": "healthy",
        "message": "mail-insight is running",
        "database": database,
        "model": state.model,
        "stages": ["parse", "classify", "summarize", "decide", "reply"],
    })))
}

/// Analyze a single message and persist the result.
async fn process_message(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_owner(&request.owner_id)?;
    if !state.limits.allow_process(&request.owner_id) {
        return Err(ApiError::RateLimited);
    }

    let raw: RawMessage = request.message.into();
    let record = state.pipeline.analyze(&raw).await?;
    let id = state.db.insert_record(&request.owner_id, &record).await?;

    Ok(Json(json!({
        "status": "success",
        "data": {"id": id, "record": record}
    })))
}

/// Analyze up to [`MAX_BATCH_SIZE`] messages independently.
///
/// One failing message does not fail the batch; every item reports its own
/// outcome.
async fn process_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_owner(&request.owner_id)?;
    if request.messages.is_empty() {
        return Err(ApiError::BadRequest("No messages provided".to_string()));
    }
    if !state.limits.allow_batch(&request.owner_id) {
        return Err(ApiError::RateLimited);
    }

    let raws: Vec<RawMessage> = request
        .messages
        .into_iter()
        .take(MAX_BATCH_SIZE)
        .map(RawMessage::from)
        .collect();

    let outcomes = state.pipeline.analyze_batch(&raws).await;

    let mut items = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(record) => match state.db.insert_record(&request.owner_id, &record).await {
                Ok(id) => items.push(BatchItem {
                    success: true,
                    id: Some(id),
                    record: Some(record),
                    error: None,
                }),
                Err(e) => items.push(BatchItem {
                    success: false,
                    id: None,
                    record: None,
                    error: Some(e.to_string()),
                }),
            },
            Err(e) => items.push(BatchItem {
                success: false,
                id: None,
                record: None,
                error: Some(e.to_string()),
            }),
        }
    }

    let processed = items.iter().filter(|i| i.success).count();
    let failed = items.len() - processed;
    Ok(Json(json!({
        "status": "success",
        "total": items.len(),
        "processed": processed,
        "failed": failed,
        "results": items,
    })))
}

async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_owner(&query.owner_id)?;
    if !state.limits.allow_list(&query.owner_id) {
        return Err(ApiError::RateLimited);
    }

    let filter = RecordFilter {
        category: query.category,
        is_important: query.is_important,
    };
    let records = state.db.list_records(&query.owner_id, &filter).await?;

    Ok(Json(json!({
        "status": "success",
        "total": records.len(),
        "data": records,
    })))
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_owner(&query.owner_id)?;

    match state.db.get_record(&id, &query.owner_id).await? {
        Some(record) => Ok(Json(json!({"status": "success", "data": record}))),
        None => Err(ApiError::NotFound(
            "Record not found or access denied".to_string(),
        )),
    }
}

async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_owner(&query.owner_id)?;

    if state.db.delete_record(&id, &query.owner_id).await? {
        Ok(Json(json!({
            "status": "success",
            "message": "Record deleted successfully"
        })))
    } else {
        Err(ApiError::NotFound(
            "Record not found or access denied".to_string(),
        ))
    }
}

async fn stats(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_owner(&query.owner_id)?;

    let stats = state.db.record_stats(&query.owner_id).await?;
    Ok(Json(json!({"status": "success", "data": stats})))
}
