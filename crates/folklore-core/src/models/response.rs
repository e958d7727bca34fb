use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::classifier::MediaClass;

/// Processing status of a response (and of individual diary pages).
///
/// The state machine is monotonic: once a record is `Completed` it never
/// moves again, and workers never move a record backwards. `Failed` is the
/// absorbing alternative for workers; only a manual re-trigger claims a
/// failed record back into `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "processing_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Terminal statuses: no further worker-driven transition is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }

    /// Whether moving from `self` to `next` respects the forward-only rule.
    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        use ProcessingStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
                // manual re-trigger claim
                | (Failed, Processing)
        )
    }
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProcessingStatus::Pending => write!(f, "pending"),
            ProcessingStatus::Processing => write!(f, "processing"),
            ProcessingStatus::Completed => write!(f, "completed"),
            ProcessingStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ProcessingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid processing status: {}", s)),
        }
    }
}

/// One submitted piece of content attached to a story (or pending story
/// creation). Content is exactly one of inline text or a stored blob.
/// Derived fields (transcription, duration, confidence) are written only by
/// the matching background worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoryResponse {
    pub id: Uuid,
    pub story_id: Option<Uuid>,
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub source: String,
    pub media_type: MediaClass,
    pub text_content: Option<String>,
    pub media_url: Option<String>,
    pub storage_key: Option<String>,
    pub processing_status: ProcessingStatus,
    pub transcription_text: Option<String>,
    pub duration_seconds: Option<f64>,
    pub ocr_confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API response body for a response record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub id: Uuid,
    pub story_id: Option<Uuid>,
    pub source: String,
    pub media_type: MediaClass,
    pub media_url: Option<String>,
    pub transcription_text: Option<String>,
    pub processing_status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
}

impl From<StoryResponse> for ResponseBody {
    fn from(response: StoryResponse) -> Self {
        // Text submissions carry their content as the transcription so the
        // client reads one field regardless of media kind.
        let transcription_text = response
            .transcription_text
            .or(response.text_content);
        Self {
            id: response.id,
            story_id: response.story_id,
            source: response.source,
            media_type: response.media_type,
            media_url: response.media_url,
            transcription_text,
            processing_status: response.processing_status,
            created_at: response.created_at,
        }
    }
}

/// Poll-able status projection for a single response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResponseStatusView {
    pub status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl From<&StoryResponse> for ResponseStatusView {
    fn from(response: &StoryResponse) -> Self {
        let transcription = if response.processing_status == ProcessingStatus::Completed {
            response
                .transcription_text
                .clone()
                .or_else(|| response.text_content.clone())
        } else {
            None
        };
        Self {
            status: response.processing_status,
            transcription,
            duration_seconds: response.duration_seconds,
            confidence: response.ocr_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_roundtrip() {
        for status in [
            ProcessingStatus::Pending,
            ProcessingStatus::Processing,
            ProcessingStatus::Completed,
            ProcessingStatus::Failed,
        ] {
            assert_eq!(
                status.to_string().parse::<ProcessingStatus>().unwrap(),
                status
            );
        }
        assert!("queued".parse::<ProcessingStatus>().is_err());
    }

    #[test]
    fn test_completed_is_absorbing() {
        use ProcessingStatus::*;
        for next in [Pending, Processing, Completed, Failed] {
            assert!(!Completed.can_transition_to(next));
        }
    }

    #[test]
    fn test_forward_only_transitions() {
        use ProcessingStatus::*;
        assert!(Pending.can_transition_to(Processing));
        // Text submissions complete synchronously without a processing phase.
        assert!(Pending.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        // Never backwards.
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Completed));
        // Manual re-trigger reopens a failed record.
        assert!(Failed.can_transition_to(Processing));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ProcessingStatus::Completed.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
        assert!(!ProcessingStatus::Pending.is_terminal());
        assert!(!ProcessingStatus::Processing.is_terminal());
    }

    fn sample_response() -> StoryResponse {
        StoryResponse {
            id: Uuid::new_v4(),
            story_id: None,
            user_id: Uuid::new_v4(),
            family_id: Uuid::new_v4(),
            source: "app_text".to_string(),
            media_type: MediaClass::Text,
            text_content: Some("Grandpa loved fishing.".to_string()),
            media_url: None,
            storage_key: None,
            processing_status: ProcessingStatus::Completed,
            transcription_text: None,
            duration_seconds: None,
            ocr_confidence: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_body_uses_text_content_as_transcription() {
        let body = ResponseBody::from(sample_response());
        assert_eq!(
            body.transcription_text.as_deref(),
            Some("Grandpa loved fishing.")
        );
        assert_eq!(body.media_url, None);
        assert_eq!(body.processing_status, ProcessingStatus::Completed);
    }

    #[test]
    fn test_status_view_hides_transcription_until_completed() {
        let mut response = sample_response();
        response.processing_status = ProcessingStatus::Processing;
        let view = ResponseStatusView::from(&response);
        assert_eq!(view.transcription, None);

        response.processing_status = ProcessingStatus::Completed;
        let view = ResponseStatusView::from(&response);
        assert_eq!(
            view.transcription.as_deref(),
            Some("Grandpa loved fishing.")
        );
    }
}
