use super::loader::{ConfigError, EngineConfig};

/// Providers the gateway factory knows how to build.
const KNOWN_PROVIDERS: &[&str] = &["gemini"];

/// Validate the complete engine configuration.
///
/// Checks sane ranges on numeric parameters and known names on string
/// parameters. Every problem is reported, not just the first.
pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_model(config, &mut errors);
    validate_gateway(config, &mut errors);
    validate_media(config, &mut errors);
    validate_sessions(config, &mut errors);
    validate_prompts(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_model(config: &EngineConfig, errors: &mut Vec<String>) {
    let m = &config.system.model;

    if !KNOWN_PROVIDERS.contains(&m.provider.as_str()) {
        errors.push(format!(
            "model.provider must be one of {:?}, got \"{}\"",
            KNOWN_PROVIDERS, m.provider
        ));
    }
    if m.model.trim().is_empty() {
        errors.push("model.model must not be empty".into());
    }
    if !(m.api_base.starts_with("https://") || m.api_base.starts_with("http://")) {
        errors.push("model.api_base must be an http(s) URL".into());
    }
    if m.api_key_env.trim().is_empty() {
        errors.push("model.api_key_env must not be empty".into());
    }
    if m.max_output_tokens == 0 {
        errors.push("model.max_output_tokens must be > 0".into());
    }
    if let Some(temp) = m.temperature {
        if !(0.0..=2.0).contains(&temp) {
            errors.push("model.temperature must be between 0.0 and 2.0".into());
        }
    }
}

fn validate_gateway(config: &EngineConfig, errors: &mut Vec<String>) {
    if config.system.gateway.request_timeout_seconds == 0 {
        errors.push("gateway.request_timeout_seconds must be > 0".into());
    }
}

fn validate_media(config: &EngineConfig, errors: &mut Vec<String>) {
    if config.system.media.max_inline_bytes == 0 {
        errors.push("media.max_inline_bytes must be > 0".into());
    }
}

fn validate_sessions(config: &EngineConfig, errors: &mut Vec<String>) {
    if config.system.sessions.max_sessions == Some(0) {
        errors.push("sessions.max_sessions must be > 0 when set".into());
    }
}

fn validate_prompts(config: &EngineConfig, errors: &mut Vec<String>) {
    for (facet, prompt) in &config.prompts {
        if prompt.trim().is_empty() {
            errors.push(format!("prompts/{} must not be empty", facet));
        }
    }
}
