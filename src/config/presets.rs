use crate::config::types::{
    EndDetectionConfig, LimitsConfig, PacingConfig, Profile, RateLimitConfig, RenderConfig,
    RotationConfig, ScrollConfig, SearchSplit,
};

/// Named run profiles
///
/// `Default` balances throughput against rate-limit pressure; `Aggressive`
/// scrolls faster and rotates credentials more often at a higher risk of
/// being throttled; `Conservative` trades speed for longer deadlines and
/// gentler pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileKind {
    #[default]
    Default,
    Aggressive,
    Conservative,
}

impl ProfileKind {
    /// Returns the prebuilt profile for this kind
    pub fn profile(&self) -> Profile {
        match self {
            Self::Default => default_profile(),
            Self::Aggressive => aggressive_profile(),
            Self::Conservative => conservative_profile(),
        }
    }
}

fn default_profile() -> Profile {
    Profile {
        rotation: RotationConfig {
            record_threshold: 50,
            cooldown_ms: 60_000,
            settle_ms: 3_000,
        },
        limits: LimitsConfig {
            timeout_limit: SearchSplit {
                unlimited: 8,
                limited: 4,
            },
            reach_timeout_max: SearchSplit {
                unlimited: 6,
                limited: 3,
            },
            max_execution_ms: SearchSplit {
                unlimited: 1_800_000,
                limited: 600_000,
            },
        },
        pacing: PacingConfig {
            per_record_secs: 2.0,
            per_hundred_secs: 8.0,
        },
        rate_limit: RateLimitConfig {
            max_retries: 5,
            base_wait_ms: 90_000,
            max_wait_ms: 180_000,
            recovery_timeout_ms: 600_000,
        },
        scroll: ScrollConfig {
            response_wait_ms: 1_500,
            stabilization_ms: 2_000,
        },
        render: RenderConfig {
            load_timeout_ms: 30_000,
            check_timeout_ms: 10_000,
            retry_delay_ms: 1_500,
            attempts: 3,
        },
        end_detection: EndDetectionConfig {
            max_empty_fetches: 8,
            max_same_height: 10,
            reply_stagnation_limit: 5,
            reply_scroll_delay_ms: 1_500,
        },
    }
}

fn aggressive_profile() -> Profile {
    Profile {
        rotation: RotationConfig {
            record_threshold: 30,
            cooldown_ms: 60_000,
            settle_ms: 1_500,
        },
        limits: LimitsConfig {
            timeout_limit: SearchSplit {
                unlimited: 12,
                limited: 6,
            },
            reach_timeout_max: SearchSplit {
                unlimited: 8,
                limited: 4,
            },
            max_execution_ms: SearchSplit {
                unlimited: 600_000,
                limited: 300_000,
            },
        },
        pacing: PacingConfig {
            per_record_secs: 0.5,
            per_hundred_secs: 3.0,
        },
        rate_limit: RateLimitConfig {
            max_retries: 5,
            base_wait_ms: 90_000,
            max_wait_ms: 180_000,
            recovery_timeout_ms: 600_000,
        },
        scroll: ScrollConfig {
            response_wait_ms: 800,
            stabilization_ms: 800,
        },
        render: RenderConfig {
            load_timeout_ms: 20_000,
            check_timeout_ms: 10_000,
            retry_delay_ms: 1_000,
            attempts: 3,
        },
        end_detection: EndDetectionConfig {
            max_empty_fetches: 12,
            max_same_height: 10,
            reply_stagnation_limit: 5,
            reply_scroll_delay_ms: 1_000,
        },
    }
}

fn conservative_profile() -> Profile {
    Profile {
        rotation: RotationConfig {
            record_threshold: 75,
            cooldown_ms: 60_000,
            settle_ms: 5_000,
        },
        limits: LimitsConfig {
            timeout_limit: SearchSplit {
                unlimited: 5,
                limited: 3,
            },
            reach_timeout_max: SearchSplit {
                unlimited: 4,
                limited: 2,
            },
            max_execution_ms: SearchSplit {
                unlimited: 3_600_000,
                limited: 1_800_000,
            },
        },
        pacing: PacingConfig {
            per_record_secs: 3.0,
            per_hundred_secs: 12.0,
        },
        rate_limit: RateLimitConfig {
            max_retries: 5,
            base_wait_ms: 120_000,
            max_wait_ms: 300_000,
            recovery_timeout_ms: 1_800_000,
        },
        scroll: ScrollConfig {
            response_wait_ms: 2_500,
            stabilization_ms: 4_000,
        },
        render: RenderConfig {
            load_timeout_ms: 45_000,
            check_timeout_ms: 10_000,
            retry_delay_ms: 2_500,
            attempts: 3,
        },
        end_detection: EndDetectionConfig {
            max_empty_fetches: 5,
            max_same_height: 10,
            reply_stagnation_limit: 5,
            reply_scroll_delay_ms: 2_000,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_values() {
        let profile = ProfileKind::Default.profile();
        assert_eq!(profile.rotation.record_threshold, 50);
        assert_eq!(profile.rate_limit.base_wait_ms, 90_000);
        assert_eq!(profile.limits.timeout_limit.unlimited, 8);
        assert_eq!(profile.end_detection.max_empty_fetches, 8);
    }

    #[test]
    fn test_aggressive_rotates_sooner() {
        let default = ProfileKind::Default.profile();
        let aggressive = ProfileKind::Aggressive.profile();
        assert!(aggressive.rotation.record_threshold < default.rotation.record_threshold);
        assert!(aggressive.scroll.response_wait_ms < default.scroll.response_wait_ms);
    }

    #[test]
    fn test_conservative_waits_longer() {
        let default = ProfileKind::Default.profile();
        let conservative = ProfileKind::Conservative.profile();
        assert!(conservative.rate_limit.max_wait_ms > default.rate_limit.max_wait_ms);
        assert!(
            conservative.limits.max_execution_ms.unlimited
                > default.limits.max_execution_ms.unlimited
        );
    }

    #[test]
    fn test_limits_resolution() {
        let profile = ProfileKind::Default.profile();

        let unlimited = profile.limits.resolve(true);
        assert_eq!(unlimited.timeout_limit, 8);
        assert_eq!(unlimited.reach_timeout_max, 6);
        assert_eq!(unlimited.max_execution.as_secs(), 1_800);

        let limited = profile.limits.resolve(false);
        assert_eq!(limited.timeout_limit, 4);
        assert_eq!(limited.reach_timeout_max, 3);
        assert_eq!(limited.max_execution.as_secs(), 600);
    }
}
