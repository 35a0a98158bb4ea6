use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the video to analyse comes from. Exactly one variant, immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Video bytes already held in memory (e.g. an upload).
    File { bytes: Vec<u8>, mime_type: String },
    /// Video on local disk, read when the analysis starts.
    /// MIME type is inferred from the extension when not given.
    Path {
        path: PathBuf,
        mime_type: Option<String>,
    },
    /// Hosted video referenced by URL. Never fetched locally.
    RemoteUrl { url: String },
}

impl MediaSource {
    /// Stable description of the source, used to derive session ids.
    pub fn identity(&self) -> String {
        match self {
            Self::File { bytes, mime_type } => format!("file:{}:{}", mime_type, bytes.len()),
            Self::Path { path, .. } => format!("path:{}", path.display()),
            Self::RemoteUrl { url } => format!("url:{}", url),
        }
    }
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { bytes, mime_type } => f
                .debug_struct("File")
                .field("len", &bytes.len())
                .field("mime_type", mime_type)
                .finish(),
            Self::Path { path, mime_type } => f
                .debug_struct("Path")
                .field("path", path)
                .field("mime_type", mime_type)
                .finish(),
            Self::RemoteUrl { url } => f.debug_struct("RemoteUrl").field("url", url).finish(),
        }
    }
}

/// One independently requestable analysis dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Summary,
    ShotAnalysis,
    Transcription,
    VisualDescription,
    LipFlapAnalysis,
}

impl Facet {
    /// Fixed execution order. Summary first: its text seeds the follow-up session.
    pub const ORDER: [Facet; 5] = [
        Facet::Summary,
        Facet::ShotAnalysis,
        Facet::Transcription,
        Facet::VisualDescription,
        Facet::LipFlapAnalysis,
    ];

    /// Key used for prompt overrides, logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::ShotAnalysis => "shot_analysis",
            Self::Transcription => "transcription",
            Self::VisualDescription => "visual_description",
            Self::LipFlapAnalysis => "lip_flap_analysis",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|f| f.as_str() == key)
    }

    /// Whether the model is asked for JSON that must go through the Normalizer.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::ShotAnalysis | Self::LipFlapAnalysis)
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facet inclusion flags. Requesting nothing is allowed and yields an empty result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetSelection {
    #[serde(default, rename = "includeSummary")]
    pub summary: bool,
    #[serde(default, rename = "includeTranscription")]
    pub transcription: bool,
    #[serde(default, rename = "includeVisualDescription")]
    pub visual_description: bool,
    #[serde(default, rename = "includeShotAnalysis")]
    pub shot_analysis: bool,
    #[serde(default, rename = "includeLipFlapAnalysis")]
    pub lip_flap_analysis: bool,
}

impl FacetSelection {
    pub fn summary_only() -> Self {
        Self {
            summary: true,
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self {
            summary: true,
            transcription: true,
            visual_description: true,
            shot_analysis: true,
            lip_flap_analysis: true,
        }
    }

    pub fn includes(&self, facet: Facet) -> bool {
        match facet {
            Facet::Summary => self.summary,
            Facet::ShotAnalysis => self.shot_analysis,
            Facet::Transcription => self.transcription,
            Facet::VisualDescription => self.visual_description,
            Facet::LipFlapAnalysis => self.lip_flap_analysis,
        }
    }

    /// Requested facets in execution order.
    pub fn requested(&self) -> Vec<Facet> {
        Facet::ORDER
            .into_iter()
            .filter(|f| self.includes(*f))
            .collect()
    }
}

/// A complete analysis request: the media plus what to do with it.
#[derive(Clone, Debug)]
pub struct VideoSource {
    pub media: MediaSource,
    /// Replaces the built-in summary instruction when non-blank.
    pub custom_prompt: Option<String>,
    pub facets: FacetSelection,
}

impl VideoSource {
    pub fn new(media: MediaSource, facets: FacetSelection) -> Self {
        Self {
            media,
            custom_prompt: None,
            facets,
        }
    }

    pub fn with_custom_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }
}
