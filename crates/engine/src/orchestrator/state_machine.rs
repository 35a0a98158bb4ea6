use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::Instrument;

use reelscope_common::config::{FailurePolicy, MediaLimits, RecordPolicy, SystemConfig};
use reelscope_common::types::{
    AnalysisResult, Facet, FacetFailure, VideoSource, ANALYSIS_FAILED_MESSAGE,
};
use reelscope_common::SessionId;

use crate::gateway::{with_timeout, GatewayError, ModelGateway};
use crate::media::{self, MediaPayload};
use crate::normalizer::{normalize_lip_flaps, normalize_shots};
use crate::prompts::PromptCatalog;
use crate::session::SessionStore;

/// Lifecycle of one analysis.
///
/// `Idle -> Encoding -> RunningFacets -> SessionOpening -> Done`, or any
/// non-terminal state `-> Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Encoding,
    RunningFacets,
    SessionOpening,
    Done,
    Failed,
}

impl AnalysisState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Encoding => "encoding",
            Self::RunningFacets => "running_facets",
            Self::SessionOpening => "session_opening",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_transition_to(&self, next: AnalysisState) -> bool {
        match (self, next) {
            (Self::Idle, Self::Encoding)
            | (Self::Encoding, Self::RunningFacets)
            | (Self::RunningFacets, Self::SessionOpening)
            | (Self::SessionOpening, Self::Done) => true,
            (current, Self::Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

/// Tunables the Orchestrator reads on every analysis.
#[derive(Clone, Debug)]
pub struct AnalysisSettings {
    pub failure_policy: FailurePolicy,
    pub record_policy: RecordPolicy,
    /// Budget for each facet call.
    pub request_timeout: Duration,
    pub media_limits: MediaLimits,
}

impl AnalysisSettings {
    pub fn from_system(system: &SystemConfig) -> Self {
        Self {
            failure_policy: system.analysis.failure_policy,
            record_policy: system.analysis.record_policy,
            request_timeout: Duration::from_secs(system.gateway.request_timeout_seconds),
            media_limits: system.media.clone(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            record_policy: RecordPolicy::default(),
            request_timeout: Duration::from_secs(120),
            media_limits: MediaLimits::default(),
        }
    }
}

/// Drives one analysis from source to result: encode once, run the requested
/// facets in order, open the follow-up session.
pub struct Orchestrator {
    gateway: Arc<dyn ModelGateway>,
    sessions: Arc<SessionStore>,
    prompts: Arc<PromptCatalog>,
    settings: AnalysisSettings,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        sessions: Arc<SessionStore>,
        prompts: Arc<PromptCatalog>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            gateway,
            sessions,
            prompts,
            settings,
        }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Run a full analysis. Never fails: failures are reported in the result.
    pub async fn run(&self, request: &VideoSource) -> AnalysisResult {
        let session_id = SessionId::derive(&request.media.identity(), Utc::now());
        let span = tracing::info_span!("analysis", session_id = %session_id);

        self.run_inner(request, session_id).instrument(span).await
    }

    async fn run_inner(&self, request: &VideoSource, session_id: SessionId) -> AnalysisResult {
        let mut state = AnalysisState::Idle;
        let facets = request.facets.requested();

        tracing::info!(
            source = ?request.media,
            facets = ?facets,
            policy = ?self.settings.failure_policy,
            "Analysis started"
        );

        // --- Encoding ---
        transition(&mut state, AnalysisState::Encoding);
        let payload = match media::encode(&request.media, &self.settings.media_limits).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Media encoding failed");
                return self.fail(&mut state);
            }
        };

        // --- RunningFacets ---
        transition(&mut state, AnalysisState::RunningFacets);
        let custom_prompt = request.custom_prompt.as_deref();
        let mut result = AnalysisResult::default();

        for facet in facets {
            let instruction = self.prompts.instruction(facet, custom_prompt);
            let raw = match self.call(facet, instruction, &payload).await {
                Ok(raw) => raw,
                Err(e) => match self.settings.failure_policy {
                    FailurePolicy::AllOrNothing => {
                        tracing::error!(facet = %facet, error = %e, "Facet failed, aborting analysis");
                        return self.fail(&mut state);
                    }
                    FailurePolicy::Partial => {
                        tracing::warn!(facet = %facet, error = %e, "Facet failed, continuing");
                        result.facet_errors.push(FacetFailure {
                            facet,
                            message: e.to_string(),
                        });
                        continue;
                    }
                },
            };

            self.store_facet(&mut result, facet, raw);
        }

        // --- SessionOpening ---
        transition(&mut state, AnalysisState::SessionOpening);
        let seed_prompt = self.prompts.instruction(Facet::Summary, custom_prompt);
        let seed_response = result.summary.as_deref().unwrap_or_default();
        self.sessions
            .create(session_id.clone(), payload, seed_prompt, seed_response);
        result.session_id = Some(session_id);

        // --- Done ---
        transition(&mut state, AnalysisState::Done);
        let outcome = if result.is_partial() { "partial" } else { "ok" };
        metrics::counter!("analysis.completed", "outcome" => outcome).increment(1);
        tracing::info!(
            outcome,
            failed_facets = result.facet_errors.len(),
            "Analysis complete"
        );

        result
    }

    async fn call(
        &self,
        facet: Facet,
        instruction: &str,
        payload: &MediaPayload,
    ) -> Result<String, GatewayError> {
        let start = std::time::Instant::now();
        let reply = with_timeout(
            self.settings.request_timeout,
            self.gateway.invoke(instruction, payload),
        )
        .await;

        tracing::debug!(
            facet = %facet,
            ok = reply.is_ok(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Facet call finished"
        );
        reply
    }

    fn store_facet(&self, result: &mut AnalysisResult, facet: Facet, raw: String) {
        let policy = self.settings.record_policy;

        match facet {
            Facet::Summary => result.summary = Some(raw),
            Facet::Transcription => result.transcription = Some(raw),
            Facet::VisualDescription => result.visual_description = Some(raw),
            Facet::ShotAnalysis => {
                let shots = normalize_shots(&raw, policy);
                tracing::info!(
                    records = shots.records.len(),
                    rejected = shots.rejected.len(),
                    failed = shots.is_failed(),
                    "Shot analysis normalized"
                );
                result.shot_analysis = shots.into_records();
            }
            Facet::LipFlapAnalysis => {
                let flaps = normalize_lip_flaps(&raw, policy);
                tracing::info!(
                    records = flaps.records.len(),
                    rejected = flaps.rejected.len(),
                    failed = flaps.is_failed(),
                    "Lip-flap analysis normalized"
                );
                result.lip_flap_analysis = flaps.into_records();
            }
        }
    }

    fn fail(&self, state: &mut AnalysisState) -> AnalysisResult {
        transition(state, AnalysisState::Failed);
        metrics::counter!("analysis.completed", "outcome" => "failed").increment(1);
        AnalysisResult::failed(ANALYSIS_FAILED_MESSAGE)
    }
}

fn transition(state: &mut AnalysisState, next: AnalysisState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid analysis transition {:?} -> {:?}",
        state,
        next
    );
    tracing::debug!(from = state.as_str(), to = next.as_str(), "Analysis state transition");
    *state = next;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
