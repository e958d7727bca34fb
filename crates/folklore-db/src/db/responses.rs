use folklore_core::models::StoryResponse;
use folklore_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for story responses.
///
/// All status mutations are conditional UPDATEs with the allowed prior
/// statuses in the WHERE clause. A `None` return from a `try_*` method means
/// the record was not in a claimable state (or does not exist); callers
/// distinguish the two with a follow-up read if they need to.
#[derive(Clone)]
pub struct ResponseRepository {
    pool: PgPool,
}

impl ResponseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, response), fields(db.table = "responses", db.record_id = %response.id))]
    pub async fn create(&self, response: &StoryResponse) -> Result<StoryResponse, AppError> {
        let row = sqlx::query_as::<Postgres, StoryResponse>(
            r#"
            INSERT INTO responses (
                id, story_id, user_id, family_id, source, media_type,
                text_content, media_url, storage_key, processing_status,
                transcription_text, duration_seconds, ocr_confidence
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(response.id)
        .bind(response.story_id)
        .bind(response.user_id)
        .bind(response.family_id)
        .bind(&response.source)
        .bind(response.media_type)
        .bind(&response.text_content)
        .bind(&response.media_url)
        .bind(&response.storage_key)
        .bind(response.processing_status)
        .bind(&response.transcription_text)
        .bind(response.duration_seconds)
        .bind(response.ocr_confidence)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(
        &self,
        family_id: Uuid,
        id: Uuid,
    ) -> Result<Option<StoryResponse>, AppError> {
        let row = sqlx::query_as::<Postgres, StoryResponse>(
            "SELECT * FROM responses WHERE family_id = $1 AND id = $2",
        )
        .bind(family_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_by_story(
        &self,
        family_id: Uuid,
        story_id: Uuid,
    ) -> Result<Vec<StoryResponse>, AppError> {
        let rows = sqlx::query_as::<Postgres, StoryResponse>(
            r#"
            SELECT * FROM responses
            WHERE family_id = $1 AND story_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(family_id)
        .bind(story_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Atomically claim a pending or failed response for re-processing.
    /// Returns the claimed row, or `None` when the response is missing,
    /// already processing, or completed.
    #[tracing::instrument(skip(self), fields(db.table = "responses", db.record_id = %id))]
    pub async fn try_claim_processing(
        &self,
        family_id: Uuid,
        id: Uuid,
    ) -> Result<Option<StoryResponse>, AppError> {
        let row = sqlx::query_as::<Postgres, StoryResponse>(
            r#"
            UPDATE responses
            SET processing_status = 'processing', updated_at = NOW()
            WHERE family_id = $1 AND id = $2
              AND processing_status IN ('pending', 'failed')
            RETURNING *
            "#,
        )
        .bind(family_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Write transcription results and complete the response. Guarded so a
    /// redelivered completion can never move a terminal record.
    #[tracing::instrument(skip(self, transcription_text), fields(db.table = "responses", db.record_id = %id))]
    pub async fn complete_transcription(
        &self,
        id: Uuid,
        transcription_text: &str,
        duration_seconds: Option<f64>,
    ) -> Result<Option<StoryResponse>, AppError> {
        let row = sqlx::query_as::<Postgres, StoryResponse>(
            r#"
            UPDATE responses
            SET processing_status = 'completed',
                transcription_text = $2,
                duration_seconds = $3,
                updated_at = NOW()
            WHERE id = $1 AND processing_status IN ('pending', 'processing')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(transcription_text)
        .bind(duration_seconds)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Write OCR results and complete the response, with the same forward
    /// guard as transcription.
    #[tracing::instrument(skip(self, extracted_text), fields(db.table = "responses", db.record_id = %id))]
    pub async fn complete_ocr(
        &self,
        id: Uuid,
        extracted_text: &str,
        ocr_confidence: Option<f64>,
    ) -> Result<Option<StoryResponse>, AppError> {
        let row = sqlx::query_as::<Postgres, StoryResponse>(
            r#"
            UPDATE responses
            SET processing_status = 'completed',
                transcription_text = $2,
                ocr_confidence = $3,
                updated_at = NOW()
            WHERE id = $1 AND processing_status IN ('pending', 'processing')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(extracted_text)
        .bind(ocr_confidence)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Undo a `try_claim_processing` claim after the event failed to publish.
    /// The response stays recoverable via a later re-trigger.
    #[tracing::instrument(skip(self), fields(db.table = "responses", db.record_id = %id))]
    pub async fn revert_to_pending(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE responses
            SET processing_status = 'pending', updated_at = NOW()
            WHERE id = $1 AND processing_status = 'processing'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark a response failed. Completed records stay completed.
    #[tracing::instrument(skip(self), fields(db.table = "responses", db.record_id = %id))]
    pub async fn mark_failed(&self, id: Uuid) -> Result<Option<StoryResponse>, AppError> {
        let row = sqlx::query_as::<Postgres, StoryResponse>(
            r#"
            UPDATE responses
            SET processing_status = 'failed', updated_at = NOW()
            WHERE id = $1 AND processing_status IN ('pending', 'processing')
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
