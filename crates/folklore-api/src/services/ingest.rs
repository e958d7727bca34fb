//! Ingestion gateway.
//!
//! Orchestrates a single response submission: upload the blob first (a failed
//! upload aborts before any row exists), classify, persist, then hand
//! enrichment to the queue. Event publishing is best-effort: the durable
//! record is the source of truth and a lost event is recoverable through the
//! manual re-trigger endpoint.

use chrono::Utc;
use folklore_core::models::{MediaClass, ProcessingStatus, StoryResponse};
use folklore_core::{classify, AppError, Event, EventEnvelope, EventMetadata};
use folklore_db::ResponseRepository;
use folklore_events::EventPublisher;
use folklore_storage::{keys, ObjectStorage};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::RequestContext;

/// Submission content: exactly one of inline text or an uploaded blob.
pub enum SubmitContent {
    Text(String),
    Blob {
        filename: String,
        content_type: String,
        data: Vec<u8>,
    },
}

pub struct SubmitRequest {
    pub story_id: Option<Uuid>,
    pub source: String,
    pub content: SubmitContent,
}

/// Outcome of a manual re-trigger.
pub enum RetriggerOutcome {
    /// Already completed; nothing republished.
    AlreadyCompleted,
    /// Claimed and republished; the event id doubles as the task id.
    Triggered { task_id: Uuid },
}

#[derive(Clone)]
pub struct IngestService {
    responses: ResponseRepository,
    storage: Arc<dyn ObjectStorage>,
    publisher: Arc<dyn EventPublisher>,
    max_upload_size_bytes: usize,
}

impl IngestService {
    pub fn new(
        responses: ResponseRepository,
        storage: Arc<dyn ObjectStorage>,
        publisher: Arc<dyn EventPublisher>,
        max_upload_size_bytes: usize,
    ) -> Self {
        Self {
            responses,
            storage,
            publisher,
            max_upload_size_bytes,
        }
    }

    /// Publish without failing the request. A lost event leaves the record
    /// in its current status, recoverable via re-trigger.
    async fn publish_best_effort(&self, envelope: EventEnvelope) {
        if let Err(e) = self.publisher.publish(&envelope).await {
            tracing::warn!(
                error = %e,
                event_id = %envelope.id,
                event_type = %envelope.event.event_type(),
                "Event publish failed; record remains recoverable via re-trigger"
            );
        }
    }

    fn metadata(&self, ctx: &RequestContext, source: &str) -> EventMetadata {
        EventMetadata {
            user_id: ctx.user_id,
            family_id: ctx.family_id,
            source: source.to_string(),
        }
    }

    /// Submit a response. Returns the created record; enrichment continues
    /// asynchronously.
    #[tracing::instrument(skip(self, request), fields(user.id = %ctx.user_id, family.id = %ctx.family_id, operation = "submit_response"))]
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        request: SubmitRequest,
    ) -> Result<StoryResponse, AppError> {
        match request.content {
            SubmitContent::Text(text) => {
                self.submit_text(ctx, request.story_id, &request.source, text)
                    .await
            }
            SubmitContent::Blob {
                filename,
                content_type,
                data,
            } => {
                self.submit_blob(
                    ctx,
                    request.story_id,
                    &request.source,
                    &filename,
                    &content_type,
                    data,
                )
                .await
            }
        }
    }

    /// Inline text completes synchronously; there is nothing to transcribe.
    async fn submit_text(
        &self,
        ctx: &RequestContext,
        story_id: Option<Uuid>,
        source: &str,
        text: String,
    ) -> Result<StoryResponse, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Text content must not be empty".to_string(),
            ));
        }

        let response = self
            .responses
            .create(&new_response(
                ctx,
                story_id,
                source,
                MediaClass::Text,
                Some(text),
                None,
                None,
                ProcessingStatus::Completed,
            ))
            .await?;

        self.publish_best_effort(EventEnvelope::new(
            Event::ResponseTranscribed {
                response_id: response.id,
                story_id: response.story_id,
            },
            self.metadata(ctx, source),
        ))
        .await;

        // Quote extraction is O(one response), so a text answer on an
        // existing story requests it immediately.
        if let Some(story_id) = response.story_id {
            self.publish_best_effort(EventEnvelope::new(
                Event::QuoteRequested {
                    story_id,
                    response_id: response.id,
                },
                self.metadata(ctx, source),
            ))
            .await;
        }

        Ok(response)
    }

    async fn submit_blob(
        &self,
        ctx: &RequestContext,
        story_id: Option<Uuid>,
        source: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoryResponse, AppError> {
        if data.is_empty() {
            return Err(AppError::InvalidInput(
                "Uploaded file must not be empty".to_string(),
            ));
        }
        if data.len() > self.max_upload_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "{} bytes exceeds max {} bytes",
                data.len(),
                self.max_upload_size_bytes
            )));
        }

        let media_class = classify(content_type, filename, source);
        let file_size = data.len() as i64;

        // A text file arrives complete: decode the payload now so the record
        // is readable without any worker ever touching it.
        let text_content = if media_class == MediaClass::Text {
            Some(String::from_utf8_lossy(&data).into_owned())
        } else {
            None
        };

        // Blob upload happens before any row is created, so a storage
        // failure aborts the whole operation with no orphan record.
        let storage_key = keys::response_key(ctx.user_id, Utc::now(), filename);
        let media_url = self
            .storage
            .put(&storage_key, content_type, data)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        // Text has no enrichment worker, so it is complete on arrival;
        // everything else waits for its worker.
        let initial_status = if media_class == MediaClass::Text {
            ProcessingStatus::Completed
        } else {
            ProcessingStatus::Pending
        };

        let response = self
            .responses
            .create(&new_response(
                ctx,
                story_id,
                source,
                media_class,
                text_content,
                Some(media_url.clone()),
                Some(storage_key.clone()),
                initial_status,
            ))
            .await?;

        match media_class {
            MediaClass::Audio => {
                self.publish_best_effort(EventEnvelope::new(
                    Event::AudioUploaded {
                        response_id: response.id,
                        storage_key,
                        media_url,
                        file_size,
                    },
                    self.metadata(ctx, source),
                ))
                .await;
            }
            MediaClass::Image | MediaClass::Document => {
                self.publish_best_effort(EventEnvelope::new(
                    Event::OcrRequested {
                        response_id: response.id,
                        storage_key,
                        media_url,
                        file_size,
                        kind: media_class,
                    },
                    self.metadata(ctx, source),
                ))
                .await;
            }
            MediaClass::Unknown => {
                // Stored and recorded, but not routed anywhere; the manual
                // re-trigger endpoint hands it to the OCR worker on demand.
                tracing::warn!(
                    response_id = %response.id,
                    content_type = %content_type,
                    filename = %filename,
                    "Unclassifiable upload stored as pending without enrichment event"
                );
            }
            MediaClass::Text => {
                // No worker mutates text responses; announce availability so
                // downstream tagging can run.
                self.publish_best_effort(EventEnvelope::new(
                    Event::ResponseTranscribed {
                        response_id: response.id,
                        story_id: response.story_id,
                    },
                    self.metadata(ctx, source),
                ))
                .await;
            }
        }

        Ok(response)
    }

    /// Manual re-trigger: claim a pending or failed response and publish its
    /// enrichment event (for `unknown` media this is the first publish, sent
    /// to the OCR worker which can sniff the actual bytes). Completed
    /// responses short-circuit; a response already being processed is a
    /// conflict.
    #[tracing::instrument(skip(self), fields(response.id = %id, operation = "retrigger_response"))]
    pub async fn retrigger(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<RetriggerOutcome, AppError> {
        let response = self
            .responses
            .get_by_id(ctx.family_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Response {} not found", id)))?;

        match response.processing_status {
            ProcessingStatus::Completed => return Ok(RetriggerOutcome::AlreadyCompleted),
            ProcessingStatus::Processing => {
                return Err(AppError::Conflict(
                    "Response is already processing".to_string(),
                ));
            }
            ProcessingStatus::Pending | ProcessingStatus::Failed => {}
        }

        // Unknown media stays re-triggerable: submission published nothing,
        // so this endpoint is the operator's recovery lever for it. Only
        // text has no worker at all.
        if response.media_type == MediaClass::Text {
            return Err(AppError::InvalidInput(format!(
                "Responses of type '{}' cannot be re-processed",
                response.media_type
            )));
        }

        let claimed = self
            .responses
            .try_claim_processing(ctx.family_id, id)
            .await?
            .ok_or_else(|| {
                // Lost the race with another trigger between read and claim.
                AppError::Conflict("Response is already processing".to_string())
            })?;

        let storage_key = claimed.storage_key.clone().ok_or_else(|| {
            AppError::Internal(format!("Response {} has no stored media", id))
        })?;
        let media_url = claimed.media_url.clone().ok_or_else(|| {
            AppError::Internal(format!("Response {} has no media URL", id))
        })?;

        let event = match claimed.media_type {
            MediaClass::Audio => Event::AudioUploaded {
                response_id: claimed.id,
                storage_key,
                media_url,
                file_size: 0,
            },
            _ => Event::OcrRequested {
                response_id: claimed.id,
                storage_key,
                media_url,
                file_size: 0,
                kind: claimed.media_type,
            },
        };

        let envelope = EventEnvelope::new(event, self.metadata(ctx, &claimed.source));
        let task_id = envelope.id;

        if let Err(e) = self.publisher.publish(&envelope).await {
            // Undo the claim so the record stays re-triggerable.
            tracing::warn!(
                error = %e,
                response_id = %id,
                "Re-trigger publish failed; reverting claim to pending"
            );
            self.responses.revert_to_pending(id).await?;
            return Err(AppError::PublishFailed(e.to_string()));
        }

        Ok(RetriggerOutcome::Triggered { task_id })
    }
}

#[allow(clippy::too_many_arguments)]
fn new_response(
    ctx: &RequestContext,
    story_id: Option<Uuid>,
    source: &str,
    media_type: MediaClass,
    text_content: Option<String>,
    media_url: Option<String>,
    storage_key: Option<String>,
    processing_status: ProcessingStatus,
) -> StoryResponse {
    StoryResponse {
        id: Uuid::new_v4(),
        story_id,
        user_id: ctx.user_id,
        family_id: ctx.family_id,
        source: source.to_string(),
        media_type,
        text_content,
        media_url,
        storage_key,
        processing_status,
        transcription_text: None,
        duration_seconds: None,
        ocr_confidence: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
