use serde::{Deserialize, Serialize};

/// Agreement between spoken audio and visible mouth movement for one window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LipFlapRecord {
    pub timestamp: String,
    pub character: String,
    /// 0–100. Higher means audio and mouth movement agree.
    pub confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LipFlapRecord {
    pub const MAX_CONFIDENCE: u8 = 100;
}
