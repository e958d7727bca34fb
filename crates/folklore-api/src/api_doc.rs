//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use folklore_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folklore Ingestion API",
        version = "0.1.0",
        description = "Family-story media ingestion and enrichment pipeline. Accepts text, audio, image and document responses plus multi-page diary scans, stores the media, and hands enrichment (transcription, OCR, quote extraction) to background workers via a typed event queue. All endpoints are versioned under /api/v1/."
    ),
    paths(
        handlers::health::health,
        // Responses
        handlers::responses::submit_response,
        handlers::responses::retrigger_response,
        handlers::responses::response_status,
        handlers::responses::list_story_responses,
        // Diary
        handlers::diary::upload_diary,
        handlers::diary::trigger_ocr,
        handlers::diary::diary_status,
        handlers::diary::create_story,
    ),
    components(schemas(
        error::ErrorResponse,
        handlers::health::HealthResponse,
        handlers::responses::RetriggerResponse,
        handlers::diary::CreateStoryBody,
        models::ResponseBody,
        models::ResponseStatusView,
        models::ProcessingStatus,
        models::DiaryStatus,
        models::DiaryUploadCreated,
        models::OcrTriggered,
        models::PageResult,
        models::DiaryStatusView,
        models::CreatedStory,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "responses", description = "Story response submission and status"),
        (name = "diary", description = "Multi-page diary uploads and OCR")
    )
)]
pub struct ApiDoc;
