use folklore_core::models::{DiaryImage, DiaryUpload, ProcessingStatus};
use folklore_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for diary uploads and their pages.
///
/// Parent status transitions are conditional UPDATEs; fan-in completion is a
/// single statement that re-checks every child page inside the update, so two
/// racing workers can never both complete the parent and a redelivered page
/// result can never complete it early.
#[derive(Clone)]
pub struct DiaryRepository {
    pool: PgPool,
}

impl DiaryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the parent record in `uploading`. Pages are attached separately
    /// so a failed bulk insert can compensate by deleting the parent.
    #[tracing::instrument(skip(self, upload), fields(db.table = "diary_uploads", db.record_id = %upload.id))]
    pub async fn create_upload(&self, upload: &DiaryUpload) -> Result<DiaryUpload, AppError> {
        let row = sqlx::query_as::<Postgres, DiaryUpload>(
            r#"
            INSERT INTO diary_uploads (id, family_id, user_id, source, page_count, processing_status)
            VALUES ($1, $2, $3, $4, 0, 'uploading')
            RETURNING *
            "#,
        )
        .bind(upload.id)
        .bind(upload.family_id)
        .bind(upload.user_id)
        .bind(&upload.source)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert all pages, set the final page_count, and move the parent from
    /// `uploading` to `pending` in one transaction. Either every page lands
    /// or none do.
    #[tracing::instrument(skip(self, pages), fields(db.table = "diary_images", upload.id = %upload_id, page_count = pages.len()))]
    pub async fn insert_pages(
        &self,
        upload_id: Uuid,
        pages: &[DiaryImage],
    ) -> Result<Vec<DiaryImage>, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut inserted = Vec::with_capacity(pages.len());
        for page in pages {
            let row = sqlx::query_as::<Postgres, DiaryImage>(
                r#"
                INSERT INTO diary_images (
                    id, upload_id, page_order, storage_key, media_url, processing_status
                )
                VALUES ($1, $2, $3, $4, $5, 'pending')
                RETURNING *
                "#,
            )
            .bind(page.id)
            .bind(upload_id)
            .bind(page.page_order)
            .bind(&page.storage_key)
            .bind(&page.media_url)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        sqlx::query(
            r#"
            UPDATE diary_uploads
            SET page_count = $2, processing_status = 'pending', updated_at = NOW()
            WHERE id = $1 AND processing_status = 'uploading'
            "#,
        )
        .bind(upload_id)
        .bind(pages.len() as i32)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(inserted)
    }

    /// Compensation for a failed page insert: removes the parent and, by
    /// cascade, any pages that did land.
    #[tracing::instrument(skip(self), fields(db.table = "diary_uploads", db.record_id = %upload_id))]
    pub async fn delete_upload(&self, upload_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM diary_uploads WHERE id = $1")
            .bind(upload_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_upload(
        &self,
        family_id: Uuid,
        upload_id: Uuid,
    ) -> Result<Option<DiaryUpload>, AppError> {
        let row = sqlx::query_as::<Postgres, DiaryUpload>(
            "SELECT * FROM diary_uploads WHERE family_id = $1 AND id = $2",
        )
        .bind(family_id)
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_pages(&self, upload_id: Uuid) -> Result<Vec<DiaryImage>, AppError> {
        let rows = sqlx::query_as::<Postgres, DiaryImage>(
            "SELECT * FROM diary_images WHERE upload_id = $1 ORDER BY page_order ASC",
        )
        .bind(upload_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Atomically claim a pending or failed upload for OCR. Returns `None`
    /// when the upload is missing, still uploading, already processing, or
    /// completed.
    #[tracing::instrument(skip(self), fields(db.table = "diary_uploads", db.record_id = %upload_id))]
    pub async fn try_begin_ocr(
        &self,
        family_id: Uuid,
        upload_id: Uuid,
    ) -> Result<Option<DiaryUpload>, AppError> {
        let row = sqlx::query_as::<Postgres, DiaryUpload>(
            r#"
            UPDATE diary_uploads
            SET processing_status = 'processing', updated_at = NOW()
            WHERE family_id = $1 AND id = $2
              AND processing_status IN ('pending', 'failed')
            RETURNING *
            "#,
        )
        .bind(family_id)
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Undo a `try_begin_ocr` claim after the fan-out event failed to
    /// publish. The upload stays recoverable via a later re-trigger.
    #[tracing::instrument(skip(self), fields(db.table = "diary_uploads", db.record_id = %upload_id))]
    pub async fn revert_to_pending(&self, upload_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE diary_uploads
            SET processing_status = 'pending', updated_at = NOW()
            WHERE id = $1 AND processing_status = 'processing'
            "#,
        )
        .bind(upload_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Write one page's OCR outcome. Forward-guarded: a redelivered result
    /// for an already-terminal page is a no-op.
    #[tracing::instrument(skip(self, extracted_text), fields(db.table = "diary_images", db.record_id = %page_id))]
    pub async fn update_page_result(
        &self,
        page_id: Uuid,
        status: ProcessingStatus,
        extracted_text: Option<&str>,
        ocr_confidence: Option<f64>,
    ) -> Result<Option<DiaryImage>, AppError> {
        let row = sqlx::query_as::<Postgres, DiaryImage>(
            r#"
            UPDATE diary_images
            SET processing_status = $2,
                extracted_text = $3,
                ocr_confidence = $4,
                updated_at = NOW()
            WHERE id = $1 AND processing_status IN ('pending', 'processing')
            RETURNING *
            "#,
        )
        .bind(page_id)
        .bind(status)
        .bind(extracted_text)
        .bind(ocr_confidence)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Fan-in: flip the parent to `completed` with aggregated text and
    /// confidence, but only if every child page is terminal. The page check
    /// runs inside the UPDATE against a consistent snapshot, so redelivery
    /// and racing workers cannot complete the parent twice or early.
    #[tracing::instrument(skip(self), fields(db.table = "diary_uploads", db.record_id = %upload_id))]
    pub async fn try_complete_upload(
        &self,
        upload_id: Uuid,
    ) -> Result<Option<DiaryUpload>, AppError> {
        let row = sqlx::query_as::<Postgres, DiaryUpload>(
            r#"
            UPDATE diary_uploads u
            SET processing_status = 'completed',
                combined_text = agg.combined_text,
                overall_confidence = agg.overall_confidence,
                processing_time_ms = (EXTRACT(EPOCH FROM (NOW() - u.updated_at)) * 1000)::BIGINT,
                updated_at = NOW()
            FROM (
                SELECT
                    string_agg(extracted_text, E'\n\n' ORDER BY page_order) AS combined_text,
                    AVG(ocr_confidence) AS overall_confidence
                FROM diary_images
                WHERE upload_id = $1 AND processing_status = 'completed'
            ) agg
            WHERE u.id = $1
              AND u.processing_status = 'processing'
              AND NOT EXISTS (
                  SELECT 1 FROM diary_images p
                  WHERE p.upload_id = u.id
                    AND p.processing_status IN ('pending', 'processing')
              )
            RETURNING u.*
            "#,
        )
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Worker-reported irrecoverable failure. Completed uploads stay
    /// completed.
    #[tracing::instrument(skip(self), fields(db.table = "diary_uploads", db.record_id = %upload_id))]
    pub async fn mark_upload_failed(
        &self,
        upload_id: Uuid,
    ) -> Result<Option<DiaryUpload>, AppError> {
        let row = sqlx::query_as::<Postgres, DiaryUpload>(
            r#"
            UPDATE diary_uploads
            SET processing_status = 'failed', updated_at = NOW()
            WHERE id = $1 AND processing_status IN ('pending', 'processing')
            RETURNING *
            "#,
        )
        .bind(upload_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Link the upload to the story created from its text.
    #[tracing::instrument(skip(self), fields(db.table = "diary_uploads", db.record_id = %upload_id))]
    pub async fn link_story(&self, upload_id: Uuid, story_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE diary_uploads SET story_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(upload_id)
        .bind(story_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
