//! Media classification
//!
//! Single total function mapping an untrusted (MIME type, filename, declared
//! source) triple to a content kind. The gateway routes every submission
//! through this, so it must always return an answer and never panic; the
//! priority order below is fixed so ambiguous inputs (e.g. a `text/plain`
//! MIME on an audio extension) resolve deterministically.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Audio file extensions accepted regardless of MIME type.
const AUDIO_EXTENSIONS: [&str; 5] = ["m4a", "wav", "mp3", "ogg", "webm"];

/// Document file extensions accepted regardless of MIME type.
const DOCUMENT_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// Content kind of a submitted response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_class", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MediaClass {
    Text,
    Audio,
    Image,
    Document,
    Unknown,
}

impl Display for MediaClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaClass::Text => write!(f, "text"),
            MediaClass::Audio => write!(f, "audio"),
            MediaClass::Image => write!(f, "image"),
            MediaClass::Document => write!(f, "document"),
            MediaClass::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for MediaClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MediaClass::Text),
            "audio" => Ok(MediaClass::Audio),
            "image" => Ok(MediaClass::Image),
            "document" => Ok(MediaClass::Document),
            "unknown" => Ok(MediaClass::Unknown),
            _ => Err(anyhow::anyhow!("Invalid media class: {}", s)),
        }
    }
}

/// Extract the lowercase extension from a filename, if any.
fn extension(filename: &str) -> Option<String> {
    let name = filename.trim();
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Whether the caller's source tag explicitly declares a text submission
/// (e.g. `app_text`, `web_text`, or plain `text`).
fn is_text_source(source: &str) -> bool {
    let source = source.trim().to_ascii_lowercase();
    source == "text" || source.ends_with("_text") || source.starts_with("text_")
}

/// Classify a submission by MIME type, filename, and declared source.
///
/// Rules are evaluated in priority order; the first match wins:
/// 1. text: `text/*` MIME, `.txt`/`.md` extension, or a declared text source
/// 2. audio: `audio/*` MIME or a known audio extension
/// 3. image: `image/*` MIME
/// 4. document: `application/pdf`, a MIME mentioning document/word, or a
///    known document extension
/// 5. unknown otherwise
pub fn classify(content_type: &str, filename: &str, source: &str) -> MediaClass {
    let mime = content_type.trim().to_ascii_lowercase();
    let ext = extension(filename);
    let ext = ext.as_deref().unwrap_or("");

    if mime.starts_with("text/") || ext == "txt" || ext == "md" || is_text_source(source) {
        return MediaClass::Text;
    }

    if mime.starts_with("audio/") || AUDIO_EXTENSIONS.contains(&ext) {
        return MediaClass::Audio;
    }

    if mime.starts_with("image/") {
        return MediaClass::Image;
    }

    if mime == "application/pdf"
        || mime.contains("document")
        || mime.contains("word")
        || DOCUMENT_EXTENSIONS.contains(&ext)
    {
        return MediaClass::Document;
    }

    MediaClass::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_text_by_mime() {
        assert_eq!(classify("text/plain", "note.bin", "app"), MediaClass::Text);
        assert_eq!(classify("TEXT/MARKDOWN", "x", "app"), MediaClass::Text);
    }

    #[test]
    fn test_classify_text_by_extension() {
        assert_eq!(classify("", "memoir.txt", "app"), MediaClass::Text);
        assert_eq!(classify("", "memoir.MD", "app"), MediaClass::Text);
    }

    #[test]
    fn test_classify_text_by_source() {
        assert_eq!(classify("", "", "app_text"), MediaClass::Text);
        assert_eq!(
            classify("application/octet-stream", "blob", "text"),
            MediaClass::Text
        );
    }

    #[test]
    fn test_text_wins_over_audio_extension() {
        // Ambiguous input: text MIME on an audio extension resolves to text.
        assert_eq!(
            classify("text/plain", "voice.mp3", "app"),
            MediaClass::Text
        );
    }

    #[test]
    fn test_classify_audio() {
        assert_eq!(classify("audio/mpeg", "a.bin", "app"), MediaClass::Audio);
        for ext in ["m4a", "wav", "mp3", "ogg", "webm"] {
            assert_eq!(
                classify("", &format!("recording.{}", ext), "app"),
                MediaClass::Audio
            );
        }
        // Extension check beats the video/* MIME for webm voice notes.
        assert_eq!(
            classify("video/webm", "note.webm", "app"),
            MediaClass::Audio
        );
    }

    #[test]
    fn test_classify_image() {
        assert_eq!(classify("image/jpeg", "page.jpg", "diary"), MediaClass::Image);
        assert_eq!(classify("image/png", "", "app"), MediaClass::Image);
    }

    #[test]
    fn test_classify_document() {
        assert_eq!(classify("application/pdf", "x", "app"), MediaClass::Document);
        assert_eq!(
            classify(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "letter",
                "app"
            ),
            MediaClass::Document
        );
        assert_eq!(classify("", "letter.docx", "app"), MediaClass::Document);
        assert_eq!(classify("", "letter.pdf", "app"), MediaClass::Document);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("", "", ""), MediaClass::Unknown);
        assert_eq!(
            classify("application/octet-stream", "mystery.bin", "app"),
            MediaClass::Unknown
        );
    }

    #[test]
    fn test_classify_is_deterministic() {
        // Same triple, same answer, every time.
        for _ in 0..3 {
            assert_eq!(
                classify("audio/mp4", "voice.m4a", "app_voice"),
                MediaClass::Audio
            );
        }
    }

    #[test]
    fn test_media_class_roundtrip() {
        for class in [
            MediaClass::Text,
            MediaClass::Audio,
            MediaClass::Image,
            MediaClass::Document,
            MediaClass::Unknown,
        ] {
            assert_eq!(class.to_string().parse::<MediaClass>().unwrap(), class);
        }
        assert!("video".parse::<MediaClass>().is_err());
    }
}
