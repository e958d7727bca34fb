//! Diary multi-page orchestrator.
//!
//! A diary upload is one parent record plus N page records. Creation is
//! compensated (a failed bulk insert deletes the parent and its pages); OCR
//! fan-out is a single event carrying every page; fan-in back to the parent
//! happens in the repository's conditional completion update.

use chrono::Utc;
use folklore_core::models::{
    CreatedStory, DiaryImage, DiaryStatus, DiaryStatusView, DiaryUpload, DiaryUploadCreated,
    OcrTriggered, ProcessingStatus, MAX_DIARY_PAGES,
};
use folklore_core::summarize::{derive_summary, derive_title};
use folklore_core::{AppError, DiaryPageRef, Event, EventEnvelope, EventMetadata};
use folklore_db::{DiaryRepository, StoryRepository};
use folklore_events::EventPublisher;
use folklore_storage::{keys, ObjectStorage};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::services::status;

/// One page image from the upload request.
pub struct PageUpload {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Caller overrides for story creation.
#[derive(Default)]
pub struct CreateStoryRequest {
    pub title: Option<String>,
    pub text: Option<String>,
}

#[derive(Clone)]
pub struct DiaryService {
    uploads: DiaryRepository,
    stories: StoryRepository,
    storage: Arc<dyn ObjectStorage>,
    publisher: Arc<dyn EventPublisher>,
    max_upload_size_bytes: usize,
    ocr_page_estimate_ms: u64,
}

impl DiaryService {
    pub fn new(
        uploads: DiaryRepository,
        stories: StoryRepository,
        storage: Arc<dyn ObjectStorage>,
        publisher: Arc<dyn EventPublisher>,
        max_upload_size_bytes: usize,
        ocr_page_estimate_ms: u64,
    ) -> Self {
        Self {
            uploads,
            stories,
            storage,
            publisher,
            max_upload_size_bytes,
            ocr_page_estimate_ms,
        }
    }

    /// Create a diary upload: parent record, one blob per page under
    /// deterministic keys, and a single-transaction page insert. Any failure
    /// after parent creation deletes the parent (pages cascade); orphaned
    /// blobs are an accepted out-of-band cleanup concern.
    #[tracing::instrument(skip(self, pages), fields(user.id = %ctx.user_id, family.id = %ctx.family_id, page_count = pages.len(), operation = "create_diary_upload"))]
    pub async fn create_upload(
        &self,
        ctx: &RequestContext,
        source: &str,
        pages: Vec<PageUpload>,
    ) -> Result<DiaryUploadCreated, AppError> {
        if pages.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one image is required".to_string(),
            ));
        }
        if pages.len() > MAX_DIARY_PAGES {
            return Err(AppError::InvalidInput(format!(
                "A diary upload is limited to {} pages",
                MAX_DIARY_PAGES
            )));
        }
        for page in &pages {
            if page.data.is_empty() {
                return Err(AppError::InvalidInput(
                    "Uploaded image must not be empty".to_string(),
                ));
            }
            if page.data.len() > self.max_upload_size_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "{} bytes exceeds max {} bytes",
                    page.data.len(),
                    self.max_upload_size_bytes
                )));
            }
        }

        let upload = self
            .uploads
            .create_upload(&new_upload(ctx, source))
            .await?;

        let mut page_records = Vec::with_capacity(pages.len());
        for (order, page) in pages.into_iter().enumerate() {
            let storage_key = keys::diary_page_key(upload.id, order as i32);
            let media_url = match self
                .storage
                .put(&storage_key, &page.content_type, page.data)
                .await
            {
                Ok(url) => url,
                Err(e) => {
                    self.compensate_failed_upload(upload.id).await;
                    return Err(AppError::Storage(e.to_string()));
                }
            };

            page_records.push(DiaryImage {
                id: Uuid::new_v4(),
                upload_id: upload.id,
                page_order: order as i32,
                storage_key,
                media_url,
                processing_status: ProcessingStatus::Pending,
                extracted_text: None,
                ocr_confidence: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }

        let inserted = match self.uploads.insert_pages(upload.id, &page_records).await {
            Ok(inserted) => inserted,
            Err(e) => {
                self.compensate_failed_upload(upload.id).await;
                return Err(e);
            }
        };

        Ok(DiaryUploadCreated {
            upload_id: upload.id,
            image_urls: inserted.iter().map(|p| p.media_url.clone()).collect(),
            status: DiaryStatus::Pending,
            page_count: inserted.len() as i32,
        })
    }

    async fn compensate_failed_upload(&self, upload_id: Uuid) {
        if let Err(e) = self.uploads.delete_upload(upload_id).await {
            tracing::error!(
                error = %e,
                upload_id = %upload_id,
                "Compensation delete failed; upload left in uploading state"
            );
        }
    }

    /// Trigger OCR fan-out. Idempotent on completed uploads, conflicts on
    /// in-flight ones, and claims pending/failed ones atomically. The fan-out
    /// is one event listing every page; per-page parallelism belongs to the
    /// worker.
    #[tracing::instrument(skip(self), fields(upload.id = %upload_id, operation = "trigger_diary_ocr"))]
    pub async fn trigger_ocr(
        &self,
        ctx: &RequestContext,
        upload_id: Uuid,
    ) -> Result<OcrTriggered, AppError> {
        let upload = self
            .uploads
            .get_upload(ctx.family_id, upload_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Diary upload {} not found", upload_id)))?;

        match upload.processing_status {
            DiaryStatus::Completed => {
                // Re-triggering finished work is a no-op, not an error.
                return Ok(OcrTriggered {
                    upload_id,
                    status: DiaryStatus::Completed,
                    estimated_time_ms: 0,
                });
            }
            DiaryStatus::Processing => {
                return Err(AppError::Conflict(
                    "Diary upload is already processing".to_string(),
                ));
            }
            DiaryStatus::Uploading => {
                return Err(AppError::Conflict(
                    "Diary upload has no pages yet".to_string(),
                ));
            }
            DiaryStatus::Pending | DiaryStatus::Failed => {}
        }

        let claimed = self
            .uploads
            .try_begin_ocr(ctx.family_id, upload_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Diary upload is already processing".to_string())
            })?;

        let pages = self.uploads.get_pages(upload_id).await?;
        let page_refs: Vec<DiaryPageRef> = pages
            .iter()
            .map(|p| DiaryPageRef {
                page_id: p.id,
                storage_key: p.storage_key.clone(),
                media_url: p.media_url.clone(),
                page_order: p.page_order,
            })
            .collect();

        let envelope = EventEnvelope::new(
            Event::DiaryOcrRequested {
                upload_id,
                pages: page_refs,
            },
            EventMetadata {
                user_id: ctx.user_id,
                family_id: ctx.family_id,
                source: claimed.source.clone(),
            },
        );

        if let Err(e) = self.publisher.publish(&envelope).await {
            // Nothing was handed to a worker: release the claim and tell the
            // caller the upload is still pending and re-triggerable.
            tracing::warn!(
                error = %e,
                upload_id = %upload_id,
                "Fan-out publish failed; reverting upload to pending"
            );
            self.uploads.revert_to_pending(upload_id).await?;
            return Ok(OcrTriggered {
                upload_id,
                status: DiaryStatus::Pending,
                estimated_time_ms: 0,
            });
        }

        Ok(OcrTriggered {
            upload_id,
            status: DiaryStatus::Processing,
            estimated_time_ms: claimed.page_count as u64 * self.ocr_page_estimate_ms,
        })
    }

    /// Status projection for polling clients.
    pub async fn status(
        &self,
        ctx: &RequestContext,
        upload_id: Uuid,
    ) -> Result<DiaryStatusView, AppError> {
        let upload = self
            .uploads
            .get_upload(ctx.family_id, upload_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Diary upload {} not found", upload_id)))?;

        let pages = self.uploads.get_pages(upload_id).await?;
        Ok(status::diary_view(&upload, &pages))
    }

    /// Create a story from a completed upload. The title and summary come
    /// from cheap synchronous text heuristics so the caller is never blocked
    /// on an AI call; the extracted text can be overridden by the caller.
    #[tracing::instrument(skip(self, request), fields(upload.id = %upload_id, operation = "create_story_from_diary"))]
    pub async fn create_story(
        &self,
        ctx: &RequestContext,
        upload_id: Uuid,
        request: CreateStoryRequest,
    ) -> Result<CreatedStory, AppError> {
        let upload = self
            .uploads
            .get_upload(ctx.family_id, upload_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Diary upload {} not found", upload_id)))?;

        if upload.processing_status != DiaryStatus::Completed {
            return Err(AppError::InvalidInput(
                "OCR has not completed for this upload".to_string(),
            ));
        }

        let extracted_text = request
            .text
            .or(upload.combined_text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AppError::InvalidInput("Upload produced no extracted text".to_string())
            })?;

        let title = request
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| derive_title(&extracted_text));
        let summary = derive_summary(&extracted_text);

        let story = self
            .stories
            .create_story_from_diary(
                upload_id,
                ctx.family_id,
                ctx.user_id,
                &title,
                &summary,
                &extracted_text,
            )
            .await?;

        Ok(CreatedStory {
            story_id: story.id,
            title: story.title,
            summary: story.summary.unwrap_or(summary),
            extracted_text,
        })
    }
}

fn new_upload(ctx: &RequestContext, source: &str) -> DiaryUpload {
    DiaryUpload {
        id: Uuid::new_v4(),
        family_id: ctx.family_id,
        user_id: ctx.user_id,
        source: source.to_string(),
        page_count: 0,
        processing_status: DiaryStatus::Uploading,
        combined_text: None,
        overall_confidence: None,
        processing_time_ms: None,
        story_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
