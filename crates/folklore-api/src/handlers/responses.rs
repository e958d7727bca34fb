//! Response submission and status endpoints.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use folklore_core::models::{ResponseBody, ResponseStatusView};
use folklore_core::AppError;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::ingest::{RetriggerOutcome, SubmitContent, SubmitRequest};
use crate::services::status;
use crate::state::AppState;

const DEFAULT_SOURCE: &str = "app";

/// Body for `POST /responses/{id}/transcribe`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RetriggerResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/responses",
    tag = "responses",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Response submitted", body = ResponseBody),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(
        user_id = %ctx.user_id,
        family_id = %ctx.family_id,
        operation = "submit_response"
    )
)]
pub async fn submit_response(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ResponseBody>), HttpAppError> {
    let mut story_id: Option<Uuid> = None;
    let mut source = DEFAULT_SOURCE.to_string();
    let mut content: Option<SubmitContent> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart request: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "story_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Invalid story_id: {}", e)))?;
                story_id = Some(value.parse::<Uuid>().map_err(|_| {
                    AppError::InvalidInput("story_id must be a UUID".to_string())
                })?);
            }
            "source" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Invalid source: {}", e)))?;
                if !value.trim().is_empty() {
                    source = value.trim().to_string();
                }
            }
            "text" => {
                if content.is_some() {
                    return Err(exactly_one_content().into());
                }
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Invalid text field: {}", e)))?;
                content = Some(SubmitContent::Text(value));
            }
            "audio" | "file" => {
                if content.is_some() {
                    return Err(exactly_one_content().into());
                }
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?
                    .to_vec();
                content = Some(SubmitContent::Blob {
                    filename,
                    content_type,
                    data,
                });
            }
            // Unknown fields are ignored rather than rejected.
            _ => {}
        }
    }

    let content = content.ok_or_else(exactly_one_content)?;

    let response = state
        .ingest
        .submit(
            &ctx,
            SubmitRequest {
                story_id,
                source,
                content,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ResponseBody::from(response))))
}

fn exactly_one_content() -> AppError {
    AppError::InvalidInput("Provide exactly one of 'text', 'audio' or 'file'".to_string())
}

#[utoipa::path(
    post,
    path = "/api/v1/responses/{id}/transcribe",
    tag = "responses",
    params(("id" = Uuid, Path, description = "Response id")),
    responses(
        (status = 200, description = "Re-trigger accepted or already complete", body = RetriggerResponse),
        (status = 400, description = "Response type cannot be re-processed", body = ErrorResponse),
        (status = 404, description = "Response not found", body = ErrorResponse),
        (status = 409, description = "Already processing", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(response_id = %id, operation = "retrigger_response"))]
pub async fn retrigger_response(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<RetriggerResponse>, HttpAppError> {
    let body = match state.ingest.retrigger(&ctx, id).await? {
        RetriggerOutcome::AlreadyCompleted => RetriggerResponse {
            success: true,
            task_id: None,
            message: Some("Response already completed".to_string()),
        },
        RetriggerOutcome::Triggered { task_id } => RetriggerResponse {
            success: true,
            task_id: Some(task_id),
            message: None,
        },
    };
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/v1/responses/{id}/status",
    tag = "responses",
    params(("id" = Uuid, Path, description = "Response id")),
    responses(
        (status = 200, description = "Current processing status", body = ResponseStatusView),
        (status = 404, description = "Response not found", body = ErrorResponse)
    )
)]
pub async fn response_status(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ResponseStatusView>, HttpAppError> {
    let response = state
        .responses
        .get_by_id(ctx.family_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Response {} not found", id)))?;

    Ok(Json(status::response_view(&response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stories/{story_id}/responses",
    tag = "responses",
    params(("story_id" = Uuid, Path, description = "Story id")),
    responses(
        (status = 200, description = "Responses in submission order", body = Vec<ResponseBody>)
    )
)]
pub async fn list_story_responses(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(story_id): Path<Uuid>,
) -> Result<Json<Vec<ResponseBody>>, HttpAppError> {
    let responses = state
        .responses
        .list_by_story(ctx.family_id, story_id)
        .await?;

    Ok(Json(
        responses.into_iter().map(ResponseBody::from).collect(),
    ))
}
