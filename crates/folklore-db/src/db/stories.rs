use folklore_core::models::{MediaClass, ProcessingStatus, Story};
use folklore_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for stories.
#[derive(Clone)]
pub struct StoryRepository {
    pool: PgPool,
}

impl StoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, story), fields(db.table = "stories", db.record_id = %story.id))]
    pub async fn create(&self, story: &Story) -> Result<Story, AppError> {
        let row = sqlx::query_as::<Postgres, Story>(
            r#"
            INSERT INTO stories (id, family_id, created_by, title, summary)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(story.id)
        .bind(story.family_id)
        .bind(story.created_by)
        .bind(&story.title)
        .bind(&story.summary)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_id(
        &self,
        family_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Story>, AppError> {
        let row = sqlx::query_as::<Postgres, Story>(
            "SELECT * FROM stories WHERE family_id = $1 AND id = $2",
        )
        .bind(family_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Materialize a story from a completed diary upload: the story insert,
    /// the `diary_ocr` response carrying the extracted text, and the upload
    /// link happen in one transaction.
    #[tracing::instrument(skip(self, title, summary, extracted_text), fields(db.table = "stories", upload.id = %upload_id))]
    pub async fn create_story_from_diary(
        &self,
        upload_id: Uuid,
        family_id: Uuid,
        created_by: Uuid,
        title: &str,
        summary: &str,
        extracted_text: &str,
    ) -> Result<Story, AppError> {
        let mut tx = self.pool.begin().await?;

        let story = sqlx::query_as::<Postgres, Story>(
            r#"
            INSERT INTO stories (id, family_id, created_by, title, summary)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(family_id)
        .bind(created_by)
        .bind(title)
        .bind(summary)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO responses (
                id, story_id, user_id, family_id, source, media_type,
                text_content, processing_status
            )
            VALUES ($1, $2, $3, $4, 'diary_ocr', $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(story.id)
        .bind(created_by)
        .bind(family_id)
        .bind(MediaClass::Text)
        .bind(extracted_text)
        .bind(ProcessingStatus::Completed)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE diary_uploads SET story_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(upload_id)
        .bind(story.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(story)
    }
}
