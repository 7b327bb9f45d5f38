use crate::config::types::Profile;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and validates a custom profile from a TOML file
///
/// The file must provide every section; the named presets are the
/// starting point for most deployments and a file override is only needed
/// when none of them fits.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use driftnet::config::load_profile;
///
/// let profile = load_profile(Path::new("profile.toml")).unwrap();
/// println!("rotation threshold: {}", profile.rotation.record_threshold);
/// ```
pub fn load_profile(path: &Path) -> Result<Profile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let profile: Profile = toml::from_str(&content)?;
    validate(&profile)?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_PROFILE: &str = r#"
[rotation]
record-threshold = 40
cooldown-ms = 60000
settle-ms = 2000

[limits.timeout-limit]
unlimited = 8
limited = 4

[limits.reach-timeout-max]
unlimited = 6
limited = 3

[limits.max-execution-ms]
unlimited = 1800000
limited = 600000

[pacing]
per-record-secs = 1.5
per-hundred-secs = 6.0

[rate-limit]
max-retries = 5
base-wait-ms = 90000
max-wait-ms = 180000
recovery-timeout-ms = 600000

[scroll]
response-wait-ms = 1500
stabilization-ms = 2000

[render]
load-timeout-ms = 30000
check-timeout-ms = 10000
retry-delay-ms = 1500
attempts = 3

[end-detection]
max-empty-fetches = 8
max-same-height = 10
reply-stagnation-limit = 5
reply-scroll-delay-ms = 1500
"#;

    fn create_temp_profile(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_profile() {
        let file = create_temp_profile(VALID_PROFILE);
        let profile = load_profile(file.path()).unwrap();

        assert_eq!(profile.rotation.record_threshold, 40);
        assert_eq!(profile.pacing.per_record_secs, 1.5);
        assert_eq!(profile.limits.timeout_limit.limited, 4);
    }

    #[test]
    fn test_load_profile_with_invalid_path() {
        let result = load_profile(Path::new("/nonexistent/profile.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_profile_with_invalid_toml() {
        let file = create_temp_profile("this is not valid TOML {{{");
        let result = load_profile(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_profile_with_validation_error() {
        let content = VALID_PROFILE.replace("base-wait-ms = 90000", "base-wait-ms = 500");
        let file = create_temp_profile(&content);

        let result = load_profile(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
