use super::types::Turn;
use super::{GatewayError, ModelGateway};
use crate::media::MediaPayload;

/// A running conversation about one video.
///
/// The gateway keeps no state between calls, so every continuation resends
/// the media and the whole turn history.
#[derive(Clone, Debug)]
pub struct Dialogue {
    media: MediaPayload,
    turns: Vec<Turn>,
}

impl Dialogue {
    /// Seed a dialogue with the summary exchange. No model call is made.
    pub fn start(
        media: MediaPayload,
        seed_prompt: impl Into<String>,
        seed_response: impl Into<String>,
    ) -> Self {
        Self {
            media,
            turns: vec![Turn::user(seed_prompt), Turn::model(seed_response)],
        }
    }

    pub fn media(&self) -> &MediaPayload {
        &self.media
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Ask a question against the current history without recording it.
    pub async fn ask(
        &self,
        gateway: &dyn ModelGateway,
        question: &str,
    ) -> Result<String, GatewayError> {
        let mut turns = Vec::with_capacity(self.turns.len() + 1);
        turns.extend_from_slice(&self.turns);
        turns.push(Turn::user(question));

        gateway.chat(&self.media, &turns).await
    }

    /// Append a completed (question, answer) pair.
    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn::user(question));
        self.turns.push(Turn::model(answer));
    }

    /// Ask and, on success, record the exchange. A failed call leaves the
    /// history untouched.
    pub async fn continue_with(
        &mut self,
        gateway: &dyn ModelGateway,
        question: &str,
    ) -> Result<String, GatewayError> {
        let answer = self.ask(gateway, question).await?;
        self.record_exchange(question, answer.clone());
        Ok(answer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayFuture, Speaker};

    /// Replies with the number of turns it was sent, or fails when scripted to.
    struct Counting {
        fail: bool,
    }

    impl ModelGateway for Counting {
        fn provider(&self) -> &str {
            "counting"
        }

        fn chat<'a>(&'a self, _media: &'a MediaPayload, turns: &'a [Turn]) -> GatewayFuture<'a> {
            let fail = self.fail;
            let count = turns.len();
            Box::pin(async move {
                if fail {
                    Err(GatewayError::Api("500 Internal".into()))
                } else {
                    Ok(format!("saw {} turns", count))
                }
            })
        }
    }

    fn dialogue() -> Dialogue {
        Dialogue::start(
            MediaPayload::Text {
                text: "https://youtu.be/dQw4w9WgXcQ".into(),
            },
            "Summarize this video.",
            "A man sings.",
        )
    }

    #[test]
    fn test_start_seeds_two_turns() {
        let d = dialogue();
        assert_eq!(d.turns().len(), 2);
        assert_eq!(d.turns()[0].speaker, Speaker::User);
        assert_eq!(d.turns()[1].speaker, Speaker::Model);
        assert_eq!(d.turns()[1].text, "A man sings.");
    }

    #[tokio::test]
    async fn test_continue_resends_full_history() {
        let mut d = dialogue();
        let gateway = Counting { fail: false };

        assert_eq!(d.continue_with(&gateway, "Who?").await.unwrap(), "saw 3 turns");
        assert_eq!(d.continue_with(&gateway, "Where?").await.unwrap(), "saw 5 turns");
        assert_eq!(d.turns().len(), 6);
        assert_eq!(d.turns()[4].text, "Where?");
        assert_eq!(d.turns()[5].text, "saw 5 turns");
    }

    #[tokio::test]
    async fn test_failed_continue_leaves_history() {
        let mut d = dialogue();
        let err = d
            .continue_with(&Counting { fail: true }, "Who?")
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Api(_)));
        assert_eq!(d.turns().len(), 2);
    }

    #[tokio::test]
    async fn test_ask_does_not_record() {
        let d = dialogue();
        d.ask(&Counting { fail: false }, "Who?").await.unwrap();
        assert_eq!(d.turns().len(), 2);
    }
}
