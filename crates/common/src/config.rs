use serde::{Deserialize, Serialize};

/// Top-level system configuration, deserialized from system.toml.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub media: MediaLimits,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub sessions: SessionLimits,
}

/// Hosted multimodal model selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider name ("gemini").
    pub provider: String,
    /// Model identifier (e.g. "gemini-2.0-flash").
    pub model: String,
    /// API root, without a trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Max tokens in each response.
    pub max_output_tokens: u32,
    /// Temperature (0.0–2.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

/// How remote (URL) media is handed to the model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteMediaMode {
    /// URL sent as a plain text part next to the instruction.
    #[default]
    Text,
    /// URL sent as a file reference the provider fetches itself.
    FileUri,
}

/// Model Gateway call behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Budget for a single facet or follow-up call. A hung call fails after this.
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub remote_media: RemoteMediaMode,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 120,
            remote_media: RemoteMediaMode::Text,
        }
    }
}

/// Limits applied by the Media Encoder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaLimits {
    /// Largest file accepted for inline (base64) transport.
    pub max_inline_bytes: u64,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            max_inline_bytes: 20 * 1024 * 1024,
        }
    }
}

/// What a single facet failure does to the whole analysis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any gateway failure discards every facet and reports one generic error.
    #[default]
    AllOrNothing,
    /// Failed facets are reported individually; successful ones are kept.
    Partial,
}

/// What the Normalizer does with a record that does not fit the vocabularies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPolicy {
    /// Drop the record and report why.
    #[default]
    RejectRecord,
    /// Keep the record, replacing unrecognized values with `unknown`.
    CoerceUnknown,
}

/// Analysis orchestration policies.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub record_policy: RecordPolicy,
}

/// Session Store sizing. No capacity means sessions live for the process lifetime.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sessions: Option<usize>,
}
