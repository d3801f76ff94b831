use super::{types::Config, ConfigError};

/// Validate configuration values that serde cannot check on its own.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    let script = &config.script;
    if !(0.0..=1.0).contains(&script.sales_probability) {
        return Err(invalid("script.sales_probability must be within [0, 1]"));
    }
    if !is_positive(script.seconds_per_char) {
        return Err(invalid("script.seconds_per_char must be positive"));
    }

    if !is_positive(config.tts.chars_per_second) {
        return Err(invalid("tts.chars_per_second must be positive"));
    }
    if !(config.tts.unit_cost.is_finite() && config.tts.unit_cost >= 0.0) {
        return Err(invalid("tts.unit_cost cannot be negative"));
    }

    let collector = &config.collector;
    if collector.max_topics == 0 || collector.per_source_limit == 0 {
        return Err(invalid(
            "collector.max_topics and collector.per_source_limit must be at least 1",
        ));
    }

    let video = &config.video;
    if video.width == 0 || video.height == 0 {
        return Err(invalid("video.width and video.height must be non-zero"));
    }
    if !(video.duration_buffer_secs.is_finite() && video.duration_buffer_secs >= 0.0) {
        return Err(invalid("video.duration_buffer_secs cannot be negative"));
    }
    if video.timeout_secs == 0 {
        return Err(invalid("video.timeout_secs cannot be 0"));
    }
    if video.fallback_query.trim().is_empty() {
        return Err(invalid("video.fallback_query cannot be empty"));
    }
    if video.preferred_fonts.is_empty() && video.fallback_fonts.is_empty() {
        return Err(invalid("at least one subtitle font must be configured"));
    }

    if let Some(llm) = &config.llm {
        if llm.model.trim().is_empty() {
            return Err(invalid("llm.model cannot be empty"));
        }
    }

    Ok(())
}

/// Finite and strictly positive; rejects NaN.
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
