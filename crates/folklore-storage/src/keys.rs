//! Deterministic storage key layout.
//!
//! Diary page keys are a pure function of `(upload_id, page_order)` so a
//! worker holding only those identifiers can locate the page without a
//! database round trip. Response keys embed the upload timestamp so repeated
//! uploads of the same filename never collide.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Replace path separators and other unsafe characters so a user-supplied
/// filename can never alter the key structure.
pub fn sanitize_filename(filename: &str) -> String {
    let mut cleaned: String = filename
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    // Backends reject keys containing "..", so the sanitized name must never
    // contain one either.
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", ".");
    }

    if cleaned.trim_matches(['_', '.']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Storage key for a single media response.
pub fn response_key(user_id: Uuid, uploaded_at: DateTime<Utc>, filename: &str) -> String {
    format!(
        "responses/{}/{}_{}",
        user_id,
        uploaded_at.timestamp_millis(),
        sanitize_filename(filename)
    )
}

/// Storage key for one diary page. Derivable from (upload_id, page_order)
/// alone.
pub fn diary_page_key(upload_id: Uuid, page_order: i32) -> String {
    format!(
        "diary/{upload_id}/diary_{upload_id}_page_{page_order}.jpg",
        upload_id = upload_id,
        page_order = page_order
    )
}
