use serde::{Deserialize, Serialize};

use reelscope_common::config::{GatewayConfig, ModelConfig, RemoteMediaMode};

use super::types::{Speaker, Turn};
use super::{GatewayError, GatewayFuture, ModelGateway};
use crate::media::MediaPayload;

// ---------------------------------------------------------------------------
// Request wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<WireContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct WireContent<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

/// Borrowed so the base64 video is not copied for every facet call.
#[derive(Serialize)]
#[serde(untagged)]
enum WirePart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: WireBlob<'a>,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: WireFileData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireFileData<'a> {
    file_uri: &'a str,
}

// ---------------------------------------------------------------------------
// Response wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[serde(default)]
    status: String,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn media_part<'a>(media: &'a MediaPayload, remote_mode: RemoteMediaMode) -> WirePart<'a> {
    match media {
        MediaPayload::Inline { data, mime_type } => WirePart::InlineData {
            inline_data: WireBlob { mime_type, data },
        },
        MediaPayload::Text { text } => match remote_mode {
            RemoteMediaMode::Text => WirePart::Text { text },
            RemoteMediaMode::FileUri => WirePart::FileData {
                file_data: WireFileData { file_uri: text },
            },
        },
    }
}

/// Media rides on the first user turn only; later turns are text.
fn to_wire_contents<'a>(
    media: &'a MediaPayload,
    turns: &'a [Turn],
    remote_mode: RemoteMediaMode,
) -> Vec<WireContent<'a>> {
    let mut media_attached = false;

    turns
        .iter()
        .map(|turn| {
            let mut parts = Vec::with_capacity(2);
            if turn.speaker == Speaker::User && !media_attached {
                parts.push(media_part(media, remote_mode));
                media_attached = true;
            }
            parts.push(WirePart::Text { text: &turn.text });

            WireContent {
                role: turn.speaker.as_wire_str(),
                parts,
            }
        })
        .collect()
}

fn from_wire_response(resp: GenerateContentResponse) -> Result<String, GatewayError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GatewayError::Blocked(reason));
    }

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::Parse("Empty candidates array".into()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                Err(GatewayError::Blocked(reason.to_string()))
            }
            other => Err(GatewayError::Parse(format!(
                "Candidate has no text (finish reason: {})",
                other.unwrap_or("none")
            ))),
        };
    }

    Ok(text)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Google Gemini `generateContent` client. One attempt per call.
pub struct GeminiGateway {
    http: reqwest::Client,
    config: ModelConfig,
    remote_mode: RemoteMediaMode,
    api_key: Option<String>,
}

impl GeminiGateway {
    /// Create a new Gemini gateway.
    /// Reads the API key from the env var named in config. A missing key is
    /// not fatal here: every call then fails with an auth error.
    pub fn new(config: ModelConfig, gateway: GatewayConfig) -> Self {
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.is_empty() => Some(key),
            _ => {
                tracing::warn!(
                    env_var = config.api_key_env.as_str(),
                    "API key not set, every model call will fail authentication"
                );
                None
            }
        };

        Self {
            http: reqwest::Client::new(),
            config,
            remote_mode: gateway.remote_media,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn send(&self, media: &MediaPayload, turns: &[Turn]) -> Result<String, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GatewayError::Auth(format!("{} is not set", self.config.api_key_env))
        })?;

        let start = std::time::Instant::now();

        let request = GenerateContentRequest {
            contents: to_wire_contents(media, turns, self.remote_mode),
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                temperature: self.config.temperature,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let status = response.status();
        let latency = start.elapsed().as_secs_f64();
        metrics::histogram!("gateway.request.latency", "provider" => "gemini", "model" => self.config.model.clone())
            .record(latency);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(format!("{}: {}", status, body)));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(GatewayError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let msg = match serde_json::from_str::<GeminiError>(&body) {
                Ok(e) => {
                    // Gemini reports a bad key as 400 INVALID_ARGUMENT.
                    if e.error.message.contains("API key not valid") {
                        return Err(GatewayError::Auth(e.error.message));
                    }
                    format!("{} {}", e.error.status, e.error.message)
                }
                Err(_) => body,
            };
            return Err(GatewayError::Api(format!("{}: {}", status, msg)));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(format!("Failed to parse Gemini response: {}", e)))?;

        from_wire_response(body)
    }
}

impl ModelGateway for GeminiGateway {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn chat<'a>(&'a self, media: &'a MediaPayload, turns: &'a [Turn]) -> GatewayFuture<'a> {
        Box::pin(async move {
            let result = self.send(media, turns).await;
            if let Err(ref e) = result {
                metrics::counter!("gateway.request.errors", "provider" => "gemini").increment(1);
                tracing::warn!(error = %e, turns = turns.len(), "Gemini call failed");
            }
            result
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn inline() -> MediaPayload {
        MediaPayload::Inline {
            data: "AAEC".into(),
            mime_type: "video/mp4".into(),
        }
    }

    #[test]
    fn test_parse_text_response() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "world"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5}
        }"#;

        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(from_wire_response(resp).unwrap(), "Hello world");
    }

    #[test]
    fn test_blocked_prompt() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            from_wire_response(resp),
            Err(GatewayError::Blocked(reason)) if reason == "SAFETY"
        ));
    }

    #[test]
    fn test_empty_candidate_is_parse_error() {
        let json = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let err = from_wire_response(resp).unwrap_err();
        assert!(matches!(err, GatewayError::Parse(_)));
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_media_only_on_first_user_turn() {
        let media = inline();
        let turns = vec![
            Turn::user("Summarize."),
            Turn::model("A dog runs."),
            Turn::user("What breed?"),
        ];

        let wire = serde_json::to_value(to_wire_contents(&media, &turns, RemoteMediaMode::Text))
            .unwrap();

        assert_eq!(wire[0]["role"], "user");
        assert_eq!(wire[0]["parts"][0]["inlineData"]["mimeType"], "video/mp4");
        assert_eq!(wire[0]["parts"][0]["inlineData"]["data"], "AAEC");
        assert_eq!(wire[0]["parts"][1]["text"], "Summarize.");
        assert_eq!(wire[1]["role"], "model");
        assert_eq!(wire[1]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(wire[2]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(wire[2]["parts"][0]["text"], "What breed?");
    }

    #[test]
    fn test_remote_media_modes() {
        let media = MediaPayload::Text {
            text: "https://youtu.be/dQw4w9WgXcQ".into(),
        };
        let turns = vec![Turn::user("Summarize.")];

        let as_text =
            serde_json::to_value(to_wire_contents(&media, &turns, RemoteMediaMode::Text)).unwrap();
        assert_eq!(as_text[0]["parts"][0]["text"], "https://youtu.be/dQw4w9WgXcQ");

        let as_file =
            serde_json::to_value(to_wire_contents(&media, &turns, RemoteMediaMode::FileUri))
                .unwrap();
        assert_eq!(
            as_file[0]["parts"][0]["fileData"]["fileUri"],
            "https://youtu.be/dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_generation_config_wire_names() {
        let request = GenerateContentRequest {
            contents: vec![],
            generation_config: GenerationConfig {
                max_output_tokens: 2048,
                temperature: None,
            },
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["generationConfig"]["maxOutputTokens"], 2048);
        assert!(wire["generationConfig"].get("temperature").is_none());
    }

    #[tokio::test]
    async fn test_missing_key_fails_auth_without_network() {
        let gateway = GeminiGateway::new(
            ModelConfig {
                provider: "gemini".into(),
                model: "gemini-2.0-flash".into(),
                api_base: "http://127.0.0.1:9".into(),
                api_key_env: "REELSCOPE_TEST_MISSING_KEY".into(),
                max_output_tokens: 256,
                temperature: None,
            },
            GatewayConfig::default(),
        );

        let err = gateway.invoke("Summarize.", &inline()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));
    }
}
