use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

use super::{Facet, LipFlapRecord, ShotRecord};

/// User-facing message for an analysis that failed as a whole.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze video. Please try again.";

/// A facet that failed while the rest of the analysis continued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetFailure {
    pub facet: Facet,
    pub message: String,
}

/// Everything one analysis produced.
///
/// A missing facet field means the facet was not requested, failed under the
/// partial policy, or normalized to zero usable records. `error` set means the
/// analysis failed as a whole.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_analysis: Option<Vec<ShotRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lip_flap_analysis: Option<Vec<LipFlapRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facet_errors: Vec<FacetFailure>,
}

impl AnalysisResult {
    /// The degraded whole-analysis failure: empty summary plus one generic error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            summary: Some(String::new()),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Whether some facets failed but the analysis as a whole went through.
    pub fn is_partial(&self) -> bool {
        self.error.is_none() && !self.facet_errors.is_empty()
    }
}
