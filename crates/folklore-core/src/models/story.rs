use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A family story. The pipeline only ever creates stories (from completed
/// diary uploads) and attaches responses to them; editing and display are
/// outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Story {
    pub id: Uuid,
    pub family_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
