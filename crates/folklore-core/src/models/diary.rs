use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::response::ProcessingStatus;

/// Hard cap on pages per diary upload. Bounds the fan-out a single request
/// can produce.
pub const MAX_DIARY_PAGES: usize = 10;

/// Lifecycle of a multi-page diary upload.
///
/// `Uploading` exists only between parent creation and the page bulk-insert;
/// clients never trigger OCR from it. The remaining states follow the same
/// forward-only rule as [`ProcessingStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "diary_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum DiaryStatus {
    Uploading,
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DiaryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DiaryStatus::Completed | DiaryStatus::Failed)
    }
}

impl Display for DiaryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DiaryStatus::Uploading => write!(f, "uploading"),
            DiaryStatus::Pending => write!(f, "pending"),
            DiaryStatus::Processing => write!(f, "processing"),
            DiaryStatus::Completed => write!(f, "completed"),
            DiaryStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for DiaryStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploading" => Ok(DiaryStatus::Uploading),
            "pending" => Ok(DiaryStatus::Pending),
            "processing" => Ok(DiaryStatus::Processing),
            "completed" => Ok(DiaryStatus::Completed),
            "failed" => Ok(DiaryStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid diary status: {}", s)),
        }
    }
}

/// Parent record for a multi-page scan batch. `page_count` always equals the
/// number of child [`DiaryImage`] rows; aggregates are written on fan-in
/// completion only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DiaryUpload {
    pub id: Uuid,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub source: String,
    pub page_count: i32,
    pub processing_status: DiaryStatus,
    pub combined_text: Option<String>,
    pub overall_confidence: Option<f64>,
    pub processing_time_ms: Option<i64>,
    pub story_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of a diary upload. Exclusively owned by its parent; deleted only
/// by cascading deletion of the upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DiaryImage {
    pub id: Uuid,
    pub upload_id: Uuid,
    pub page_order: i32,
    pub storage_key: String,
    pub media_url: String,
    pub processing_status: ProcessingStatus,
    pub extracted_text: Option<String>,
    pub ocr_confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Progress of an in-flight upload as an integer percentage.
///
/// Floor division, and capped at 99 while the parent is not `completed`: the
/// aggregator only ever reports 100 once the parent record itself says so.
pub fn progress_percent(terminal_pages: usize, total_pages: usize) -> u8 {
    if total_pages == 0 {
        return 0;
    }
    let pct = (terminal_pages * 100) / total_pages;
    pct.min(99) as u8
}

/// Response body for `POST /diary/upload`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiaryUploadCreated {
    pub upload_id: Uuid,
    pub image_urls: Vec<String>,
    pub status: DiaryStatus,
    pub page_count: i32,
}

/// Response body for `POST /diary/{upload_id}/ocr`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OcrTriggered {
    pub upload_id: Uuid,
    pub status: DiaryStatus,
    pub estimated_time_ms: u64,
}

/// Per-page result included in the status view once the upload completes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageResult {
    pub page_order: i32,
    pub status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f64>,
}

impl From<&DiaryImage> for PageResult {
    fn from(page: &DiaryImage) -> Self {
        Self {
            page_order: page.page_order,
            status: page.processing_status,
            extracted_text: page.extracted_text.clone(),
            ocr_confidence: page.ocr_confidence,
        }
    }
}

/// Poll-able status projection for a diary upload (see the status aggregator).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiaryStatusView {
    pub upload_id: Uuid,
    pub status: DiaryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<PageResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body for `POST /diary/{upload_id}/create-story`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedStory {
    pub story_id: Uuid,
    pub title: String,
    pub summary: String,
    pub extracted_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diary_status_roundtrip() {
        for status in [
            DiaryStatus::Uploading,
            DiaryStatus::Pending,
            DiaryStatus::Processing,
            DiaryStatus::Completed,
            DiaryStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<DiaryStatus>().unwrap(), status);
        }
        assert!("stalled".parse::<DiaryStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(DiaryStatus::Completed.is_terminal());
        assert!(DiaryStatus::Failed.is_terminal());
        assert!(!DiaryStatus::Uploading.is_terminal());
        assert!(!DiaryStatus::Pending.is_terminal());
        assert!(!DiaryStatus::Processing.is_terminal());
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 4), 0);
        assert_eq!(progress_percent(1, 4), 25);
        assert_eq!(progress_percent(2, 4), 50);
        assert_eq!(progress_percent(3, 4), 75);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
    }

    #[test]
    fn test_progress_never_reports_100_while_in_flight() {
        // Even with every page terminal, 100 is reserved for the parent
        // record actually flipping to completed.
        assert_eq!(progress_percent(4, 4), 99);
        assert_eq!(progress_percent(10, 10), 99);
    }

    #[test]
    fn test_progress_with_zero_pages() {
        assert_eq!(progress_percent(0, 0), 0);
    }
}
