//! Event contract between the ingestion gateway and background workers.
//!
//! Every unit of background work is described by an [`EventEnvelope`] handed
//! to the queue. The payload is an adjacently-tagged enum, so the payload
//! shape is fully determined by the `type` discriminator and consumers get a
//! deserialization error (park the message) for unknown types instead of
//! guessing at a loose JSON shape.
//!
//! Delivery is at-least-once and unordered; consumers must be idempotent per
//! event `id` and may only ever move a target record's status forward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classifier::MediaClass;

/// Schema version stamped on every envelope.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

/// Reference to one diary page inside a fan-out event. Everything a worker
/// needs to OCR the page without a second lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryPageRef {
    pub page_id: Uuid,
    pub storage_key: String,
    pub media_url: String,
    pub page_order: i32,
}

/// Typed event payloads, one variant per event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// An audio response was stored and awaits transcription.
    #[serde(rename = "response.audio.uploaded")]
    AudioUploaded {
        response_id: Uuid,
        storage_key: String,
        media_url: String,
        file_size: i64,
    },

    /// A response's text is available (inline text submissions complete
    /// synchronously); downstream tagging may run, nothing blocks on it.
    #[serde(rename = "response.transcribed")]
    ResponseTranscribed {
        response_id: Uuid,
        story_id: Option<Uuid>,
    },

    /// An image or document response awaits OCR.
    #[serde(rename = "response.ocr.requested")]
    OcrRequested {
        response_id: Uuid,
        storage_key: String,
        media_url: String,
        file_size: i64,
        kind: MediaClass,
    },

    /// All pages of a diary upload, as one fan-out event. The worker owns
    /// per-page parallelism and failure isolation.
    #[serde(rename = "diary.ocr.requested")]
    DiaryOcrRequested {
        upload_id: Uuid,
        pages: Vec<DiaryPageRef>,
    },

    /// Extract quotes from a single new response on an existing story.
    /// Deliberately not a full story re-tag: tagging is O(whole story),
    /// quote extraction is O(one response).
    #[serde(rename = "wisdom.quote.requested")]
    QuoteRequested { story_id: Uuid, response_id: Uuid },
}

impl Event {
    /// The wire discriminator for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::AudioUploaded { .. } => "response.audio.uploaded",
            Event::ResponseTranscribed { .. } => "response.transcribed",
            Event::OcrRequested { .. } => "response.ocr.requested",
            Event::DiaryOcrRequested { .. } => "diary.ocr.requested",
            Event::QuoteRequested { .. } => "wisdom.quote.requested",
        }
    }
}

/// Submission context carried on every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub source: String,
}

/// The unit of work handed to the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub version: u32,
    #[serde(flatten)]
    pub event: Event,
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    pub fn new(event: Event, metadata: EventMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            version: EVENT_SCHEMA_VERSION,
            event,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> EventMetadata {
        EventMetadata {
            user_id: Uuid::new_v4(),
            family_id: Uuid::new_v4(),
            source: "app_voice".to_string(),
        }
    }

    #[test]
    fn test_envelope_wire_shape() {
        let response_id = Uuid::new_v4();
        let envelope = EventEnvelope::new(
            Event::AudioUploaded {
                response_id,
                storage_key: "responses/u/1_voice.m4a".to_string(),
                media_url: "http://localhost/media/responses/u/1_voice.m4a".to_string(),
                file_size: 1024,
            },
            metadata(),
        );

        let json = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(json["type"], "response.audio.uploaded");
        assert_eq!(json["version"], 1);
        assert_eq!(
            json["payload"]["response_id"],
            serde_json::json!(response_id)
        );
        assert!(json["id"].is_string());
        assert!(json["timestamp"].is_string());
        assert_eq!(json["metadata"]["source"], "app_voice");
    }

    #[test]
    fn test_envelope_roundtrip() {
        let envelope = EventEnvelope::new(
            Event::DiaryOcrRequested {
                upload_id: Uuid::new_v4(),
                pages: vec![DiaryPageRef {
                    page_id: Uuid::new_v4(),
                    storage_key: "diary/x/diary_x_page_0.jpg".to_string(),
                    media_url: "http://localhost/media/diary/x/diary_x_page_0.jpg".to_string(),
                    page_order: 0,
                }],
            },
            metadata(),
        );

        let json = serde_json::to_string(&envelope).expect("serialize");
        let parsed: EventEnvelope = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "timestamp": Utc::now(),
            "version": 1,
            "type": "response.video.uploaded",
            "payload": { "response_id": Uuid::new_v4() },
            "metadata": { "user_id": Uuid::new_v4(), "family_id": Uuid::new_v4(), "source": "app" },
        });
        assert!(serde_json::from_value::<EventEnvelope>(json).is_err());
    }

    #[test]
    fn test_event_type_matches_serde_tag() {
        let event = Event::QuoteRequested {
            story_id: Uuid::new_v4(),
            response_id: Uuid::new_v4(),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], event.event_type());
    }
}
