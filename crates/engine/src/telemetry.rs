/// Install the JSON tracing subscriber, filtered by `RUST_LOG` with `info` as
/// the floor.
///
/// Meant for hosts without their own subscriber. Returns an error if a global
/// subscriber is already installed, so calling it twice is harmless.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init()
}
