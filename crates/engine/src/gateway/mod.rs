mod dialogue;
mod gemini;
pub mod types;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reelscope_common::config::{GatewayConfig, ModelConfig};
use reelscope_common::ReelscopeError;

use crate::config::ConfigError;
use crate::media::MediaPayload;

pub use dialogue::Dialogue;
pub use gemini::GeminiGateway;
pub use types::{Speaker, Turn};

/// Errors from hosted model calls. Surfaced to the caller, never retried here.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Model HTTP error: {0}")]
    Http(String),

    #[error("Model auth error: {0}")]
    Auth(String),

    #[error("Model rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("Model API error: {0}")]
    Api(String),

    #[error("Model blocked the request: {0}")]
    Blocked(String),

    #[error("Model response parse error: {0}")]
    Parse(String),

    #[error("Model call timed out after {0}s")]
    Timeout(u64),
}

impl From<GatewayError> for ReelscopeError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Timeout(_) => ReelscopeError::Timeout(e.to_string()),
            other => ReelscopeError::ModelInvocation(other.to_string()),
        }
    }
}

/// Boxed future returned by gateway calls.
pub type GatewayFuture<'a> = Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>>;

/// Object-safe seam in front of the hosted multimodal model.
/// Tests provide scripted gateways; production uses [`GeminiGateway`].
///
/// Implementations are stateless: the full turn history is passed on every
/// call and `media` belongs to the first user turn.
pub trait ModelGateway: Send + Sync {
    /// Provider label for logs and metrics.
    fn provider(&self) -> &str;

    /// Send a conversation and return the model's text reply.
    fn chat<'a>(&'a self, media: &'a MediaPayload, turns: &'a [Turn]) -> GatewayFuture<'a>;

    /// One-shot call: a single instruction about the media.
    fn invoke<'a>(&'a self, instruction: &'a str, media: &'a MediaPayload) -> GatewayFuture<'a> {
        Box::pin(async move {
            let turns = [Turn::user(instruction)];
            self.chat(media, &turns).await
        })
    }
}

/// Build the gateway for the configured provider.
pub fn build_gateway(
    model: &ModelConfig,
    gateway: &GatewayConfig,
) -> Result<Arc<dyn ModelGateway>, ConfigError> {
    match model.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiGateway::new(model.clone(), gateway.clone()))),
        other => Err(ConfigError::Validation(format!(
            "Unknown model provider: {}",
            other
        ))),
    }
}

/// Bound a gateway call by `budget`. Expiry becomes [`GatewayError::Timeout`].
pub async fn with_timeout<F>(budget: Duration, call: F) -> Result<String, GatewayError>
where
    F: Future<Output = Result<String, GatewayError>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => {
            metrics::counter!("gateway.request.timeouts").increment(1);
            Err(GatewayError::Timeout(budget.as_secs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelscope_common::config::RemoteMediaMode;

    struct Echo;

    impl ModelGateway for Echo {
        fn provider(&self) -> &str {
            "echo"
        }

        fn chat<'a>(&'a self, _media: &'a MediaPayload, turns: &'a [Turn]) -> GatewayFuture<'a> {
            let last = turns.last().map(|t| t.text.clone()).unwrap_or_default();
            Box::pin(async move { Ok(format!("{} turns, last: {}", turns.len(), last)) })
        }
    }

    struct Hang;

    impl ModelGateway for Hang {
        fn provider(&self) -> &str {
            "hang"
        }

        fn chat<'a>(&'a self, _media: &'a MediaPayload, _turns: &'a [Turn]) -> GatewayFuture<'a> {
            Box::pin(std::future::pending())
        }
    }

    fn media() -> MediaPayload {
        MediaPayload::Text {
            text: "https://youtu.be/dQw4w9WgXcQ".into(),
        }
    }

    #[tokio::test]
    async fn test_invoke_sends_single_user_turn() {
        let reply = Echo.invoke("Summarize.", &media()).await.unwrap();
        assert_eq!(reply, "1 turns, last: Summarize.");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_gateway_error() {
        let media = media();
        let err = with_timeout(Duration::from_millis(20), Hang.invoke("x", &media))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(_)));

        let top: ReelscopeError = err.into();
        assert!(matches!(top, ReelscopeError::Timeout(_)));
    }

    #[test]
    fn test_build_gateway_dispatches_on_provider() {
        let mut model = ModelConfig {
            provider: "gemini".into(),
            model: "gemini-2.0-flash".into(),
            api_base: "https://example.invalid".into(),
            api_key_env: "REELSCOPE_TEST_UNSET_KEY".into(),
            max_output_tokens: 1024,
            temperature: None,
        };
        let gateway = GatewayConfig {
            request_timeout_seconds: 10,
            remote_media: RemoteMediaMode::Text,
        };

        let built = build_gateway(&model, &gateway).unwrap();
        assert_eq!(built.provider(), "gemini");

        model.provider = "carrier-pigeon".into();
        let err = build_gateway(&model, &gateway).err().unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_auth_error_is_model_failure() {
        let err: ReelscopeError = GatewayError::Auth("401".into()).into();
        assert!(err.is_model_failure());
    }
}
