//! Platform error classification
//!
//! The platform never reports errors through status codes the engine can
//! see; everything arrives as rendered phrases inside response bodies or
//! page text, in either of two languages. Classification is pure pattern
//! matching: case-insensitive substring search against known phrase sets,
//! first matching category wins, rate limiting checked before blocked
//! sessions.

use std::fmt;

/// Rate-limit phrasing, both languages (lowercase)
const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "límite de tasa", "limite de tasa"];

/// Blocked-session phrasing, both languages (lowercase)
const CREDENTIAL_BLOCKED_MARKERS: &[&str] =
    &["something went wrong", "algo salió mal", "algo salio mal"];

/// Phrases the platform renders when a feed is exhausted
pub const END_OF_FEED_MARKERS: &[&str] = &[
    "No results for",
    "End of timeline",
    "No more posts",
    "this page doesn't exist",
    "You're up to date",
    "That's all for now",
    "No se encontraron",
    "Fin de la cronología",
    "No hay más publicaciones",
    "esta página no existe",
    "Estás al día",
    "Eso es todo por ahora",
];

/// Phrases the platform renders on its login wall
pub const LOGIN_WALL_MARKERS: &[&str] = &[
    "Sign in to continue",
    "Log in to continue",
    "Inicia sesión para continuar",
    "Iniciar sesión",
];

/// A recoverable platform error recognized in a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// The current credential is being throttled
    RateLimit,

    /// The current session is blocked or broken
    CredentialBlocked,
}

impl PlatformError {
    /// Human-readable reason used in logs and blacklist entries
    pub fn reason(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate limit detected",
            Self::CredentialBlocked => "session blocked by the platform",
        }
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Classifies the body of an intercepted paginated response
///
/// Rate-limit phrasing wins over blocked-session phrasing when both
/// happen to match. Returns `None` for a healthy body.
pub fn classify_response(body: &str) -> Option<PlatformError> {
    let lower = body.to_lowercase();

    if RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(PlatformError::RateLimit);
    }

    if CREDENTIAL_BLOCKED_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(PlatformError::CredentialBlocked);
    }

    None
}

/// Whether a thrown error's message matches any recoverable phrase set
///
/// Errors that do not match are treated as fatal by the session loop.
pub fn is_recoverable_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    RATE_LIMIT_MARKERS
        .iter()
        .chain(CREDENTIAL_BLOCKED_MARKERS)
        .any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert_eq!(
            classify_response("{\"errors\":[{\"message\":\"Rate limit exceeded\"}]}"),
            Some(PlatformError::RateLimit)
        );
        assert_eq!(
            classify_response("Se alcanzó el límite de tasa"),
            Some(PlatformError::RateLimit)
        );
    }

    #[test]
    fn test_blocked_session_detection() {
        assert_eq!(
            classify_response("Something went wrong. Try reloading."),
            Some(PlatformError::CredentialBlocked)
        );
        assert_eq!(
            classify_response("Algo salió mal"),
            Some(PlatformError::CredentialBlocked)
        );
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(
            classify_response("RATE LIMIT"),
            Some(PlatformError::RateLimit)
        );
        assert_eq!(
            classify_response("SOMETHING WENT WRONG"),
            Some(PlatformError::CredentialBlocked)
        );
    }

    #[test]
    fn test_rate_limit_wins_when_both_match() {
        let body = "Something went wrong: rate limit exceeded";
        assert_eq!(classify_response(body), Some(PlatformError::RateLimit));
    }

    #[test]
    fn test_healthy_body_classifies_as_none() {
        assert_eq!(classify_response("{\"data\":{\"entries\":[]}}"), None);
        assert_eq!(classify_response(""), None);
    }

    #[test]
    fn test_recoverable_message_detection() {
        assert!(is_recoverable_message("upstream said: rate limit"));
        assert!(is_recoverable_message("Algo salio mal while parsing"));
        assert!(!is_recoverable_message("selector not found"));
    }
}
