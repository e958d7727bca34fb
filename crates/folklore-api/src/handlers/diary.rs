//! Diary upload, OCR trigger, status, and story creation endpoints.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use folklore_core::models::{CreatedStory, DiaryStatusView, DiaryUploadCreated, OcrTriggered};
use folklore_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::diary::{CreateStoryRequest, PageUpload};
use crate::state::AppState;

const DEFAULT_SOURCE: &str = "app";

/// Optional overrides for `POST /diary/{upload_id}/create-story`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateStoryBody {
    pub title: Option<String>,
    pub text: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/diary/upload",
    tag = "diary",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Diary upload created", body = DiaryUploadCreated),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "Image too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(
        user_id = %ctx.user_id,
        family_id = %ctx.family_id,
        operation = "upload_diary"
    )
)]
pub async fn upload_diary(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DiaryUploadCreated>), HttpAppError> {
    let mut source = DEFAULT_SOURCE.to_string();
    let mut pages: Vec<PageUpload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart request: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "source" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Invalid source: {}", e)))?;
                if !value.trim().is_empty() {
                    source = value.trim().to_string();
                }
            }
            // Pages arrive in request order, which defines page order.
            "images" | "images[]" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read image: {}", e)))?
                    .to_vec();
                pages.push(PageUpload { content_type, data });
            }
            _ => {}
        }
    }

    let created = state.diary.create_upload(&ctx, &source, pages).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/diary/{upload_id}/ocr",
    tag = "diary",
    params(("upload_id" = Uuid, Path, description = "Diary upload id")),
    responses(
        (status = 202, description = "OCR triggered (or already complete)", body = OcrTriggered),
        (status = 404, description = "Upload not found", body = ErrorResponse),
        (status = 409, description = "Already processing", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(upload_id = %upload_id, operation = "trigger_diary_ocr"))]
pub async fn trigger_ocr(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(upload_id): Path<Uuid>,
) -> Result<(StatusCode, Json<OcrTriggered>), HttpAppError> {
    let triggered = state.diary.trigger_ocr(&ctx, upload_id).await?;
    Ok((StatusCode::ACCEPTED, Json(triggered)))
}

#[utoipa::path(
    get,
    path = "/api/v1/diary/{upload_id}/status",
    tag = "diary",
    params(("upload_id" = Uuid, Path, description = "Diary upload id")),
    responses(
        (status = 200, description = "Current upload status", body = DiaryStatusView),
        (status = 404, description = "Upload not found", body = ErrorResponse)
    )
)]
pub async fn diary_status(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(upload_id): Path<Uuid>,
) -> Result<Json<DiaryStatusView>, HttpAppError> {
    let view = state.diary.status(&ctx, upload_id).await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/diary/{upload_id}/create-story",
    tag = "diary",
    params(("upload_id" = Uuid, Path, description = "Diary upload id")),
    request_body(content = CreateStoryBody, content_type = "application/json"),
    responses(
        (status = 201, description = "Story created from extracted text", body = CreatedStory),
        (status = 400, description = "OCR has not completed", body = ErrorResponse),
        (status = 404, description = "Upload not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(upload_id = %upload_id, operation = "create_story_from_diary"))]
pub async fn create_story(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(upload_id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedStory>), HttpAppError> {
    // The body is optional; an empty body means no overrides.
    let body: CreateStoryBody = if body.is_empty() {
        CreateStoryBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid JSON body: {}", e)))?
    };
    let created = state
        .diary
        .create_story(
            &ctx,
            upload_id,
            CreateStoryRequest {
                title: body.title,
                text: body.text,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}
