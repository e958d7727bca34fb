//! Application state shared across handlers.

use folklore_core::Config;
use folklore_db::{DiaryRepository, ResponseRepository, StoryRepository};
use folklore_events::EventPublisher;
use folklore_storage::ObjectStorage;
use sqlx::PgPool;
use std::sync::Arc;

use crate::services::diary::DiaryService;
use crate::services::ingest::IngestService;

/// Everything a handler can reach. Built once at startup; the publisher and
/// storage backends are injected here so tests can swap them for in-memory
/// and tempdir-backed implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub responses: ResponseRepository,
    pub diary_uploads: DiaryRepository,
    pub stories: StoryRepository,
    pub ingest: IngestService,
    pub diary: DiaryService,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: PgPool,
        storage: Arc<dyn ObjectStorage>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let responses = ResponseRepository::new(pool.clone());
        let diary_uploads = DiaryRepository::new(pool.clone());
        let stories = StoryRepository::new(pool.clone());

        let ingest = IngestService::new(
            responses.clone(),
            storage.clone(),
            publisher.clone(),
            config.max_upload_size_bytes,
        );
        let diary = DiaryService::new(
            diary_uploads.clone(),
            stories.clone(),
            storage,
            publisher,
            config.max_upload_size_bytes,
            config.ocr_page_estimate_ms,
        );

        Self {
            config,
            pool,
            responses,
            diary_uploads,
            stories,
            ingest,
            diary,
        }
    }
}
