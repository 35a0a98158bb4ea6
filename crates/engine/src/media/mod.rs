mod youtube;

use std::fmt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as base64_engine;
use base64::Engine;

use reelscope_common::config::MediaLimits;
use reelscope_common::types::MediaSource;
use reelscope_common::ReelscopeError;

pub use youtube::{is_valid_youtube_url, youtube_video_id};

/// Transport-ready form of a video, derived once per analysis and reused for
/// every facet call.
#[derive(Clone, PartialEq, Eq)]
pub enum MediaPayload {
    /// Base64 (standard alphabet) video bytes.
    Inline { data: String, mime_type: String },
    /// Remote video referenced by URL.
    Text { text: String },
}

impl MediaPayload {
    /// Recover the original bytes of an inline payload.
    pub fn decode_inline(&self) -> Result<Vec<u8>, EncodingError> {
        match self {
            Self::Inline { data, .. } => base64_engine
                .decode(data)
                .map_err(|e| EncodingError::Encode(format!("invalid base64 payload: {}", e))),
            Self::Text { .. } => Err(EncodingError::Encode(
                "payload references remote media, nothing to decode".into(),
            )),
        }
    }
}

impl fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline { data, mime_type } => f
                .debug_struct("Inline")
                .field("mime_type", mime_type)
                .field("encoded_len", &data.len())
                .finish(),
            Self::Text { text } => f.debug_struct("Text").field("text", text).finish(),
        }
    }
}

/// Errors from preparing media for transport.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode media: {0}")]
    Encode(String),
}

impl From<EncodingError> for ReelscopeError {
    fn from(e: EncodingError) -> Self {
        ReelscopeError::Encoding(e.to_string())
    }
}

/// Turn a media source into its transport payload.
///
/// Remote URLs are wrapped as-is: no fetch, no reachability or shape check.
pub async fn encode(source: &MediaSource, limits: &MediaLimits) -> Result<MediaPayload, EncodingError> {
    match source {
        MediaSource::RemoteUrl { url } => Ok(MediaPayload::Text { text: url.clone() }),
        MediaSource::File { bytes, mime_type } => encode_bytes(bytes, mime_type, limits),
        MediaSource::Path { path, mime_type } => {
            let mime_type = match mime_type {
                Some(m) => m.clone(),
                None => infer_mime_type(path).map(str::to_string).ok_or_else(|| {
                    EncodingError::Encode(format!(
                        "cannot infer a video MIME type for {}",
                        path.display()
                    ))
                })?,
            };

            let bytes = tokio::fs::read(path).await.map_err(|e| EncodingError::Io {
                path: path.clone(),
                source: e,
            })?;

            tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read media file");
            encode_bytes(&bytes, &mime_type, limits)
        }
    }
}

fn encode_bytes(
    bytes: &[u8],
    mime_type: &str,
    limits: &MediaLimits,
) -> Result<MediaPayload, EncodingError> {
    let mime_type = mime_type.trim();
    let is_video = mime_type.starts_with("video/") && mime_type.len() > "video/".len();
    if !is_video && mime_type != "application/octet-stream" {
        return Err(EncodingError::Encode(format!(
            "unsupported MIME type '{}', expected video/*",
            mime_type
        )));
    }

    if bytes.is_empty() {
        return Err(EncodingError::Encode("media is empty".into()));
    }

    if bytes.len() as u64 > limits.max_inline_bytes {
        return Err(EncodingError::Encode(format!(
            "media is {} bytes, inline limit is {}",
            bytes.len(),
            limits.max_inline_bytes
        )));
    }

    Ok(MediaPayload::Inline {
        data: base64_engine.encode(bytes),
        mime_type: mime_type.to_string(),
    })
}

/// MIME type for common video container extensions.
pub fn infer_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    let mime = match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp" => "video/3gpp",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        _ => return None,
    };
    Some(mime)
}
