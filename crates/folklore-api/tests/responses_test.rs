//! Response submission, re-trigger and status endpoints.

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use chrono::Utc;
use folklore_core::models::Story;
use helpers::{api_path, spawn_app};
use serde_json::Value;
use uuid::Uuid;

fn text_form(text: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("text", text)
        .add_text("source", "app_text")
}

fn audio_form() -> MultipartForm {
    let part = Part::bytes(vec![0u8; 2048])
        .file_name("voice memo.m4a")
        .mime_type("audio/m4a");
    MultipartForm::new()
        .add_part("audio", part)
        .add_text("source", "app_voice")
}

#[tokio::test]
async fn test_text_submission_completes_synchronously() {
    let app = spawn_app().await;

    let res = app
        .post("/responses")
        .multipart(text_form("Grandpa built the cabin in 1962."))
        .await;
    res.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = res.json();
    assert_eq!(body["processingStatus"], "completed");
    assert_eq!(body["mediaType"], "text");
    assert_eq!(
        body["transcriptionText"],
        "Grandpa built the cabin in 1962."
    );
    // Inline text never touches the blob store.
    assert!(body["mediaUrl"].is_null());

    // No story attached: transcribed announcement only, no quote request.
    assert_eq!(app.published_types(), vec!["response.transcribed"]);
}

#[tokio::test]
async fn test_text_submission_on_story_requests_quote() {
    let app = spawn_app().await;

    let story = app
        .state
        .stories
        .create(&Story {
            id: Uuid::new_v4(),
            family_id: app.family_id,
            created_by: app.user_id,
            title: "The cabin".to_string(),
            summary: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    let form = text_form("He always said measure twice.").add_text("story_id", story.id.to_string());
    let res = app.post("/responses").multipart(form).await;
    res.assert_status(axum::http::StatusCode::CREATED);

    assert_eq!(
        app.published_types(),
        vec!["response.transcribed", "wisdom.quote.requested"]
    );

    let list: Vec<Value> = app
        .get(&format!("/stories/{}/responses", story.id))
        .await
        .json();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["storyId"], story.id.to_string());
}

#[tokio::test]
async fn test_text_file_upload_completes_with_readable_content() {
    let app = spawn_app().await;

    let part = Part::bytes(b"Notes from the reunion at the lake house.".to_vec())
        .file_name("notes.txt")
        .mime_type("text/plain");
    let form = MultipartForm::new()
        .add_part("file", part)
        .add_text("source", "app_upload");

    let res = app.post("/responses").multipart(form).await;
    res.assert_status(axum::http::StatusCode::CREATED);

    // The payload is decoded on ingest: the record is complete and readable
    // even though the raw file also went to the blob store.
    let body: Value = res.json();
    assert_eq!(body["processingStatus"], "completed");
    assert_eq!(body["mediaType"], "text");
    assert_eq!(
        body["transcriptionText"],
        "Notes from the reunion at the lake house."
    );
    let media_url = body["mediaUrl"].as_str().expect("blob was stored");
    assert!(media_url.ends_with("_notes.txt"));

    assert_eq!(app.published_types(), vec!["response.transcribed"]);

    let response_id = body["id"].as_str().unwrap();
    let status: Value = app
        .get(&format!("/responses/{}/status", response_id))
        .await
        .json();
    assert_eq!(status["status"], "completed");
    assert_eq!(
        status["transcription"],
        "Notes from the reunion at the lake house."
    );
}

#[tokio::test]
async fn test_audio_submission_is_pending_and_publishes_event() {
    let app = spawn_app().await;

    let res = app.post("/responses").multipart(audio_form()).await;
    res.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = res.json();
    assert_eq!(body["processingStatus"], "pending");
    assert_eq!(body["mediaType"], "audio");
    let response_id = body["id"].as_str().unwrap().to_string();

    let published = app.publisher.published();
    assert_eq!(published.len(), 1);
    let json = serde_json::to_value(&published[0]).unwrap();
    assert_eq!(json["type"], "response.audio.uploaded");
    assert_eq!(json["payload"]["response_id"], response_id);
    assert_eq!(json["metadata"]["source"], "app_voice");
    // Deterministic key scheme, filename sanitized.
    let key = json["payload"]["storage_key"].as_str().unwrap();
    assert!(key.starts_with(&format!("responses/{}/", app.user_id)));
    assert!(key.ends_with("_voice_memo.m4a"));

    let status: Value = app
        .get(&format!("/responses/{}/status", response_id))
        .await
        .json();
    assert_eq!(status["status"], "pending");
    assert!(status.get("transcription").is_none());
}

#[tokio::test]
async fn test_retrigger_claims_then_conflicts_then_completes() {
    let app = spawn_app().await;

    let body: Value = app.post("/responses").multipart(audio_form()).await.json();
    let response_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    app.publisher.clear();

    // First trigger claims the record and republishes.
    let res = app
        .post(&format!("/responses/{}/transcribe", response_id))
        .await;
    res.assert_status_ok();
    let triggered: Value = res.json();
    assert_eq!(triggered["success"], true);
    assert!(triggered["task_id"].is_string());
    assert_eq!(app.published_types(), vec!["response.audio.uploaded"]);

    // Claimed record is now processing: a second trigger conflicts.
    let res = app
        .post(&format!("/responses/{}/transcribe", response_id))
        .await;
    res.assert_status(axum::http::StatusCode::CONFLICT);

    // Simulate the transcription worker finishing.
    app.state
        .responses
        .complete_transcription(response_id, "We drove out to the lake.", Some(12.5))
        .await
        .unwrap()
        .expect("worker completion should apply");

    let status: Value = app
        .get(&format!("/responses/{}/status", response_id))
        .await
        .json();
    assert_eq!(status["status"], "completed");
    assert_eq!(status["transcription"], "We drove out to the lake.");
    assert_eq!(status["duration_seconds"], 12.5);

    // Re-triggering completed work is a no-op, not an error.
    app.publisher.clear();
    let res = app
        .post(&format!("/responses/{}/transcribe", response_id))
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["success"], true);
    assert!(body.get("task_id").is_none());
    assert!(app.publisher.published().is_empty());
}

#[tokio::test]
async fn test_retrigger_publish_failure_reverts_to_pending() {
    let app = spawn_app().await;

    let body: Value = app.post("/responses").multipart(audio_form()).await.json();
    let response_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    app.publisher.set_failing(true);
    let res = app
        .post(&format!("/responses/{}/transcribe", response_id))
        .await;
    res.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

    // The claim was rolled back, so a later trigger succeeds.
    app.publisher.set_failing(false);
    app.publisher.clear();
    let res = app
        .post(&format!("/responses/{}/transcribe", response_id))
        .await;
    res.assert_status_ok();
    assert_eq!(app.published_types(), vec!["response.audio.uploaded"]);
}

#[tokio::test]
async fn test_completed_text_retrigger_short_circuits() {
    let app = spawn_app().await;

    let body: Value = app
        .post("/responses")
        .multipart(text_form("Nothing to transcribe."))
        .await
        .json();
    let response_id = body["id"].as_str().unwrap();

    // Completed short-circuits before the media-type check.
    let res = app
        .post(&format!("/responses/{}/transcribe", response_id))
        .await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>()["success"], true);
}

#[tokio::test]
async fn test_unknown_upload_is_recoverable_via_manual_trigger() {
    let app = spawn_app().await;

    let part = Part::bytes(vec![0u8; 128])
        .file_name("data.bin")
        .mime_type("application/octet-stream");
    let form = MultipartForm::new()
        .add_part("file", part)
        .add_text("source", "app_upload");

    let res = app.post("/responses").multipart(form).await;
    res.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = res.json();
    assert_eq!(body["mediaType"], "unknown");
    assert_eq!(body["processingStatus"], "pending");
    let response_id = body["id"].as_str().unwrap();

    // Unclassifiable uploads publish nothing on submission.
    assert!(app.publisher.published().is_empty());

    // The manual trigger is the recovery lever: it claims the record and
    // hands it to the OCR worker with its stored kind.
    let res = app
        .post(&format!("/responses/{}/transcribe", response_id))
        .await;
    res.assert_status_ok();
    assert_eq!(res.json::<Value>()["success"], true);

    let published = app.publisher.published();
    assert_eq!(published.len(), 1);
    let json = serde_json::to_value(&published[0]).unwrap();
    assert_eq!(json["type"], "response.ocr.requested");
    assert_eq!(json["payload"]["kind"], "unknown");
    assert_eq!(json["payload"]["response_id"], response_id);
}

#[tokio::test]
async fn test_submission_requires_exactly_one_content_field() {
    let app = spawn_app().await;

    let res = app
        .post("/responses")
        .multipart(MultipartForm::new().add_text("source", "app"))
        .await;
    res.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let form = text_form("some text").add_part(
        "file",
        Part::bytes(vec![1, 2, 3]).file_name("scan.jpg").mime_type("image/jpeg"),
    );
    let res = app.post("/responses").multipart(form).await;
    res.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_identity_headers_is_bad_request() {
    let app = spawn_app().await;

    let res = app
        .server
        .post(&api_path("/responses"))
        .multipart(text_form("hello"))
        .await;
    res.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_response_is_not_found() {
    let app = spawn_app().await;

    let res = app
        .get(&format!("/responses/{}/status", Uuid::new_v4()))
        .await;
    res.assert_status(axum::http::StatusCode::NOT_FOUND);
}
