//! Panel error classification.
//!
//! Callers branch on [`ErrorKind`], never on raw message text. Raw
//! upstream bodies go to the log; the chat layer renders canned phrases.

use thiserror::Error;

use panelbot_types::PanelDialectKind;

/// Classified failure category for a panel call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401/403 or a dialect-specific auth error token.
    Unauthorized,
    /// 429 from the upstream panel.
    RateLimited,
    /// 404, with diagnostic detail about which URL/dialect was tried.
    NotFound,
    /// Connection refused or request timeout.
    Connection,
    /// Anything else the panel reported.
    Api,
}

/// A classified panel failure.
#[derive(Debug, Clone, Error)]
#[error("panel error ({kind:?}): {message}")]
pub struct PanelError {
    pub kind: ErrorKind,
    /// Internal diagnostic text. Logged, never sent to chat.
    pub message: String,
}

impl PanelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, message)
    }

    /// Classify an HTTP status code, carrying the URL and dialect tried so
    /// misconfigured deployments are quick to debug from the log.
    pub fn from_status(
        status: reqwest::StatusCode,
        url: &str,
        dialect: PanelDialectKind,
        body_excerpt: &str,
    ) -> Self {
        let kind = match status.as_u16() {
            401 | 403 => ErrorKind::Unauthorized,
            429 => ErrorKind::RateLimited,
            404 => ErrorKind::NotFound,
            _ => ErrorKind::Api,
        };
        Self::new(
            kind,
            format!("HTTP {status} from {url} ({dialect} dialect): {body_excerpt}"),
        )
    }

    /// Whether the endpoint fallback chain should try the next candidate.
    ///
    /// Auth, throttling, and transport failures affect every candidate the
    /// same way, so the chain stops; a missing endpoint or an error
    /// envelope is specific to the candidate tried.
    pub fn try_next_candidate(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound | ErrorKind::Api)
    }
}

impl From<reqwest::Error> for PanelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::new(ErrorKind::Connection, err.to_string())
        } else {
            Self::new(ErrorKind::Api, err.to_string())
        }
    }
}

/// Upstream phrasings that mean "no such data" rather than a hard error.
/// Used by provider discovery to distinguish an empty result from failure.
const NO_DATA_PATTERNS: &[&str] = &[
    "not found",
    "no data",
    "no orders",
    "no records",
    "nothing found",
    "empty",
];

impl PanelError {
    /// Whether this error means "the panel has no such data", a legitimate
    /// terminal state for discovery operations.
    pub fn is_no_data(&self) -> bool {
        if self.kind == ErrorKind::NotFound {
            return true;
        }
        let lower = self.message.to_lowercase();
        NO_DATA_PATTERNS.iter().any(|p| lower.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_classify() {
        let cases = [
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Unauthorized),
            (429, ErrorKind::RateLimited),
            (404, ErrorKind::NotFound),
            (500, ErrorKind::Api),
            (502, ErrorKind::Api),
        ];
        for (code, expected) in cases {
            let status = reqwest::StatusCode::from_u16(code).unwrap();
            let err = PanelError::from_status(
                status,
                "https://p.example.com/api/v2",
                PanelDialectKind::Action,
                "",
            );
            assert_eq!(err.kind, expected, "status {code}");
        }
    }

    #[test]
    fn not_found_carries_url_and_dialect() {
        let err = PanelError::from_status(
            reqwest::StatusCode::NOT_FOUND,
            "https://p.example.com/v2/orders/1",
            PanelDialectKind::Rest,
            "",
        );
        assert!(err.message.contains("https://p.example.com/v2/orders/1"));
        assert!(err.message.contains("rest"));
    }

    #[test]
    fn fallback_predicate() {
        assert!(PanelError::new(ErrorKind::NotFound, "").try_next_candidate());
        assert!(PanelError::new(ErrorKind::Api, "").try_next_candidate());
        assert!(!PanelError::new(ErrorKind::Unauthorized, "").try_next_candidate());
        assert!(!PanelError::new(ErrorKind::RateLimited, "").try_next_candidate());
        assert!(!PanelError::new(ErrorKind::Connection, "").try_next_candidate());
    }

    #[test]
    fn no_data_patterns_recognized() {
        assert!(PanelError::api("Order not found").is_no_data());
        assert!(PanelError::api("NO DATA available").is_no_data());
        assert!(PanelError::new(ErrorKind::NotFound, "whatever").is_no_data());
        assert!(!PanelError::api("internal server error").is_no_data());
        assert!(!PanelError::new(ErrorKind::Unauthorized, "bad_auth").is_no_data());
    }
}
