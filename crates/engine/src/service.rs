use std::path::PathBuf;
use std::sync::Arc;

use reelscope_common::types::{AnalysisResult, VideoSource};
use reelscope_common::SessionId;

use crate::config::{self, ConfigError, EngineConfig};
use crate::gateway::{build_gateway, ModelGateway};
use crate::media;
use crate::orchestrator::{AnalysisSettings, Orchestrator};
use crate::prompts::PromptCatalog;
use crate::session::{FollowUpError, SessionStore};

/// Reply to a follow-up on a session id the store does not know.
pub const SESSION_NOT_FOUND_REPLY: &str = "Session not found. Please analyze the video again.";

/// Reply to a follow-up whose model call failed.
pub const FOLLOW_UP_FAILED_REPLY: &str =
    "Sorry, I couldn't answer that question. Please try again.";

/// Environment variable naming the configuration directory.
pub const CONFIG_DIR_ENV: &str = "REELSCOPE_CONFIG_DIR";

/// The three entry points a UI host calls.
pub struct ReelscopeService {
    gateway: Arc<dyn ModelGateway>,
    sessions: Arc<SessionStore>,
    orchestrator: Orchestrator,
}

impl ReelscopeService {
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    /// Analyze a video across the requested facets and open a follow-up
    /// session. Failures are reported in the result, never raised.
    pub async fn analyze_video(&self, request: &VideoSource) -> AnalysisResult {
        self.orchestrator.run(request).await
    }

    /// Answer a question about a previously analyzed video.
    ///
    /// Always returns display text: the model's answer, or a fixed failure
    /// message. The session history only grows when an answer comes back.
    pub async fn ask_follow_up_question(&self, session_id: &str, question: &str) -> String {
        let id = SessionId::from(session_id);
        let budget = self.orchestrator.settings().request_timeout;

        match self
            .sessions
            .follow_up(&id, self.gateway.as_ref(), question, budget)
            .await
        {
            Ok(answer) => {
                metrics::counter!("followup.requests", "outcome" => "ok").increment(1);
                tracing::info!(session_id = %id, "Follow-up answered");
                answer
            }
            Err(FollowUpError::Session(e)) => {
                metrics::counter!("followup.requests", "outcome" => "not_found").increment(1);
                tracing::warn!(error = %e, "Follow-up on unknown session");
                SESSION_NOT_FOUND_REPLY.to_string()
            }
            Err(FollowUpError::Gateway(e)) => {
                metrics::counter!("followup.requests", "outcome" => "failed").increment(1);
                tracing::warn!(session_id = %id, error = %e, "Follow-up failed");
                FOLLOW_UP_FAILED_REPLY.to_string()
            }
        }
    }

    /// Pre-submission shape check for YouTube URLs.
    pub fn is_valid_youtube_url(url: &str) -> bool {
        media::is_valid_youtube_url(url)
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn provider(&self) -> &str {
        self.gateway.provider()
    }
}

/// Assembles a [`ReelscopeService`] from configuration or injected parts.
#[derive(Default)]
pub struct ServiceBuilder {
    gateway: Option<Arc<dyn ModelGateway>>,
    sessions: Option<Arc<SessionStore>>,
    prompts: Option<PromptCatalog>,
    settings: AnalysisSettings,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything from a loaded configuration, including the real gateway.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        config::validate(config)?;

        let system = &config.system;
        let gateway = build_gateway(&system.model, &system.gateway)?;
        let sessions = match system.sessions.max_sessions {
            Some(capacity) => SessionStore::with_capacity(capacity),
            None => SessionStore::new(),
        };

        Ok(Self {
            gateway: Some(gateway),
            sessions: Some(Arc::new(sessions)),
            prompts: Some(PromptCatalog::with_overrides(&config.prompts)),
            settings: AnalysisSettings::from_system(system),
        })
    }

    /// Load configuration from `$REELSCOPE_CONFIG_DIR`, or `./config`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let config = config::load_config(&config_dir)?;
        Self::from_config(&config)
    }

    pub fn gateway(mut self, gateway: Arc<dyn ModelGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn sessions(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn prompts(mut self, prompts: PromptCatalog) -> Self {
        self.prompts = Some(prompts);
        self
    }

    pub fn settings(mut self, settings: AnalysisSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Result<ReelscopeService, ConfigError> {
        let gateway = self
            .gateway
            .ok_or_else(|| ConfigError::Validation("no model gateway configured".into()))?;
        let sessions = self.sessions.unwrap_or_default();
        let prompts = Arc::new(self.prompts.unwrap_or_default());

        tracing::info!(
            provider = gateway.provider(),
            failure_policy = ?self.settings.failure_policy,
            record_policy = ?self.settings.record_policy,
            session_capacity = ?sessions.capacity(),
            "Reelscope service ready"
        );

        let orchestrator =
            Orchestrator::new(gateway.clone(), sessions.clone(), prompts, self.settings);

        Ok(ReelscopeService {
            gateway,
            sessions,
            orchestrator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelscope_common::config::SystemConfig;

    #[test]
    fn test_build_requires_gateway() {
        let err = ServiceBuilder::new().build().err().unwrap();
        assert!(err.to_string().contains("no model gateway"));
    }

    #[test]
    fn test_from_config_applies_session_capacity() {
        let system: SystemConfig = toml::from_str(
            r#"
            [model]
            provider = "gemini"
            model = "gemini-2.0-flash"
            api_key_env = "REELSCOPE_TEST_SERVICE_KEY"
            max_output_tokens = 1024

            [sessions]
            max_sessions = 8
            "#,
        )
        .unwrap();

        let service = ServiceBuilder::from_config(&EngineConfig::from_system(system))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(service.provider(), "gemini");
        assert_eq!(service.sessions().capacity(), Some(8));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let system: SystemConfig = toml::from_str(
            r#"
            [model]
            provider = "gemini"
            model = "gemini-2.0-flash"
            max_output_tokens = 0
            "#,
        )
        .unwrap();

        assert!(ServiceBuilder::from_config(&EngineConfig::from_system(system)).is_err());
    }

    #[test]
    fn test_youtube_predicate_exposed() {
        assert!(ReelscopeService::is_valid_youtube_url(
            "https://youtu.be/dQw4w9WgXcQ"
        ));
        assert!(!ReelscopeService::is_valid_youtube_url(
            "https://youtu.be/dQw4w9WgXc"
        ));
    }
}
