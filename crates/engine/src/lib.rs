//! Video analysis on top of a hosted multimodal model.
//!
//! [`ReelscopeService`] is the entry point: analyze a video across the
//! requested facets, then ask follow-up questions in the session the analysis
//! opened.

pub mod config;
pub mod gateway;
pub mod media;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
pub mod service;
pub mod session;
pub mod telemetry;

pub use media::is_valid_youtube_url;
pub use service::{ReelscopeService, ServiceBuilder};
