use crate::config::types::{
    EndDetectionConfig, PacingConfig, Profile, RateLimitConfig, RenderConfig, RotationConfig,
    ScrollConfig,
};
use crate::ConfigError;

/// Validates an entire profile
pub fn validate(profile: &Profile) -> Result<(), ConfigError> {
    validate_rotation(&profile.rotation)?;
    validate_pacing(&profile.pacing)?;
    validate_rate_limit(&profile.rate_limit)?;
    validate_scroll(&profile.scroll)?;
    validate_render(&profile.render)?;
    validate_end_detection(&profile.end_detection)?;
    Ok(())
}

fn validate_rotation(config: &RotationConfig) -> Result<(), ConfigError> {
    if config.record_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "record_threshold must be >= 1, got {}",
            config.record_threshold
        )));
    }

    if config.cooldown_ms < 1_000 {
        return Err(ConfigError::Validation(format!(
            "cooldown_ms must be >= 1000ms, got {}ms",
            config.cooldown_ms
        )));
    }

    Ok(())
}

fn validate_pacing(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.per_record_secs < 0.0 || config.per_hundred_secs < 0.0 {
        return Err(ConfigError::Validation(
            "pacing delays cannot be negative".to_string(),
        ));
    }

    Ok(())
}

fn validate_rate_limit(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.base_wait_ms < 1_000 {
        return Err(ConfigError::Validation(format!(
            "base_wait_ms must be >= 1000ms, got {}ms",
            config.base_wait_ms
        )));
    }

    if config.max_wait_ms < config.base_wait_ms {
        return Err(ConfigError::Validation(format!(
            "max_wait_ms ({}) must be >= base_wait_ms ({})",
            config.max_wait_ms, config.base_wait_ms
        )));
    }

    if config.recovery_timeout_ms < config.max_wait_ms {
        return Err(ConfigError::Validation(format!(
            "recovery_timeout_ms ({}) must be >= max_wait_ms ({})",
            config.recovery_timeout_ms, config.max_wait_ms
        )));
    }

    Ok(())
}

fn validate_scroll(config: &ScrollConfig) -> Result<(), ConfigError> {
    if config.response_wait_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "response_wait_ms must be >= 100ms, got {}ms",
            config.response_wait_ms
        )));
    }

    Ok(())
}

fn validate_render(config: &RenderConfig) -> Result<(), ConfigError> {
    if config.attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "render attempts must be >= 1, got {}",
            config.attempts
        )));
    }

    if config.check_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "check_timeout_ms must be >= 100ms, got {}ms",
            config.check_timeout_ms
        )));
    }

    Ok(())
}

fn validate_end_detection(config: &EndDetectionConfig) -> Result<(), ConfigError> {
    if config.max_empty_fetches < 1 {
        return Err(ConfigError::Validation(format!(
            "max_empty_fetches must be >= 1, got {}",
            config.max_empty_fetches
        )));
    }

    if config.max_same_height < 1 {
        return Err(ConfigError::Validation(format!(
            "max_same_height must be >= 1, got {}",
            config.max_same_height
        )));
    }

    if config.reply_stagnation_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "reply_stagnation_limit must be >= 1, got {}",
            config.reply_stagnation_limit
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileKind;

    #[test]
    fn test_presets_are_valid() {
        assert!(validate(&ProfileKind::Default.profile()).is_ok());
        assert!(validate(&ProfileKind::Aggressive.profile()).is_ok());
        assert!(validate(&ProfileKind::Conservative.profile()).is_ok());
    }

    #[test]
    fn test_rejects_zero_rotation_threshold() {
        let mut profile = ProfileKind::Default.profile();
        profile.rotation.record_threshold = 0;

        let result = validate(&profile);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_cap_below_base_wait() {
        let mut profile = ProfileKind::Default.profile();
        profile.rate_limit.max_wait_ms = profile.rate_limit.base_wait_ms - 1;

        let result = validate(&profile);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_tiny_response_wait() {
        let mut profile = ProfileKind::Default.profile();
        profile.scroll.response_wait_ms = 10;

        assert!(validate(&profile).is_err());
    }

    #[test]
    fn test_rejects_negative_pacing() {
        let mut profile = ProfileKind::Default.profile();
        profile.pacing.per_record_secs = -1.0;

        assert!(validate(&profile).is_err());
    }
}
