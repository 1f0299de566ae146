//! The two panel API dialects behind one trait.
//!
//! Deployments speak either an action-based query API (`key=…&action=…`,
//! `{status, error}` JSON bodies) or a RESTful API (header credential,
//! resource paths, responses sometimes double-wrapped in `{data: {...}}`).
//! The client selects one implementation at construction time; no call
//! site branches on the dialect kind.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use panelbot_types::{Panel, PanelDialectKind};

use crate::endpoints::Candidate;
use crate::error::{ErrorKind, PanelError};

/// Marker in diagnostics for bodies that are not a recognizable envelope
/// (HTML challenge pages, proxies, truncated JSON).
const OPAQUE_BODY: &str = "unrecognizable response body";

/// Request building and response interpretation for one dialect.
pub trait PanelDialect: Send + Sync {
    fn kind(&self) -> PanelDialectKind;

    /// Build the HTTP request for one endpoint candidate. Returns the full
    /// URL alongside the builder for error diagnostics.
    fn build_request(
        &self,
        http: &Client,
        panel: &Panel,
        candidate: &Candidate,
        params: &[(&str, String)],
    ) -> (String, RequestBuilder);

    /// Interpret a response. `Ok` carries the payload with any dialect
    /// envelope stripped; `Err` is classified.
    fn parse_response(
        &self,
        status: StatusCode,
        url: &str,
        body: &str,
    ) -> Result<Value, PanelError>;

    /// Whether the body looks like this dialect's envelope at all.
    /// Used by the runtime probe: a recognizable *error* envelope still
    /// identifies the dialect, an opaque page does not.
    fn recognizes(&self, body: &str) -> bool;
}

/// Select the dialect implementation for a kind.
pub fn dialect_for(kind: PanelDialectKind) -> &'static dyn PanelDialect {
    match kind {
        PanelDialectKind::Action => &ActionDialect,
        PanelDialectKind::Rest => &RestDialect,
    }
}

/// Auth error tokens the action dialect uses in its `error` field.
const ACTION_AUTH_ERRORS: &[&str] = &["bad_auth", "invalid_key", "invalid_api_key", "unauthorized"];

/// Query-string action API: credential and action name travel as query
/// parameters, errors come back as `{"error": "..."}` or
/// `{"status": "error", ...}` with HTTP 200.
pub struct ActionDialect;

impl PanelDialect for ActionDialect {
    fn kind(&self) -> PanelDialectKind {
        PanelDialectKind::Action
    }

    fn build_request(
        &self,
        http: &Client,
        panel: &Panel,
        candidate: &Candidate,
        params: &[(&str, String)],
    ) -> (String, RequestBuilder) {
        let url = format!("{}{}", panel.base_url.trim_end_matches('/'), candidate.path);

        let mut query: Vec<(&str, String)> = vec![("key", panel.api_key.clone())];
        if let Some(action) = candidate.action {
            query.push(("action", action.to_string()));
        }
        query.extend(params.iter().map(|(k, v)| (*k, v.clone())));

        let builder = match candidate.method {
            "GET" => http.get(&url),
            _ => http.post(&url),
        };
        (url.clone(), builder.query(&query))
    }

    fn parse_response(
        &self,
        status: StatusCode,
        url: &str,
        body: &str,
    ) -> Result<Value, PanelError> {
        if !status.is_success() {
            return Err(PanelError::from_status(status, url, self.kind(), excerpt(body)));
        }

        let value: Value = serde_json::from_str(body)
            .map_err(|_| PanelError::api(format!("{OPAQUE_BODY} from {url}")))?;

        // Error envelope: {"error": "..."} with HTTP 200.
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            let kind = if ACTION_AUTH_ERRORS.contains(&error.to_lowercase().as_str()) {
                ErrorKind::Unauthorized
            } else {
                ErrorKind::Api
            };
            return Err(PanelError::new(kind, format!("{error} (from {url})")));
        }

        // Error envelope: {"status": "error"|"fail", "message": ...}.
        if let Some(s) = value.get("status").and_then(Value::as_str) {
            if s.eq_ignore_ascii_case("error") || s.eq_ignore_ascii_case("fail") {
                let detail = value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("panel reported an error");
                return Err(PanelError::api(format!("{detail} (from {url})")));
            }
        }

        Ok(value)
    }

    fn recognizes(&self, body: &str) -> bool {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => {
                map.contains_key("error")
                    || map.contains_key("status")
                    || map.contains_key("balance")
                    || map.contains_key("currency")
            }
            _ => false,
        }
    }
}

/// RESTful API: credential in a header, resource-path endpoints, payloads
/// sometimes wrapped in one or two `{"data": ...}` envelopes.
pub struct RestDialect;

impl PanelDialect for RestDialect {
    fn kind(&self) -> PanelDialectKind {
        PanelDialectKind::Rest
    }

    fn build_request(
        &self,
        http: &Client,
        panel: &Panel,
        candidate: &Candidate,
        params: &[(&str, String)],
    ) -> (String, RequestBuilder) {
        let mut path = candidate.path.to_string();
        let mut body_params: Vec<(&str, String)> = Vec::new();
        for (k, v) in params {
            if path.contains("{id}") && *k == "order" {
                path = path.replace("{id}", v);
            } else {
                body_params.push((*k, v.clone()));
            }
        }

        let url = format!("{}{}", panel.base_url.trim_end_matches('/'), path);
        let builder = match candidate.method {
            "GET" => {
                let b = http.get(&url);
                if body_params.is_empty() {
                    b
                } else {
                    b.query(&body_params)
                }
            }
            _ => {
                let map: serde_json::Map<String, Value> = body_params
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v)))
                    .collect();
                http.post(&url).json(&Value::Object(map))
            }
        };
        (url, builder.header("X-Api-Key", panel.api_key.clone()))
    }

    fn parse_response(
        &self,
        status: StatusCode,
        url: &str,
        body: &str,
    ) -> Result<Value, PanelError> {
        if !status.is_success() {
            return Err(PanelError::from_status(status, url, self.kind(), excerpt(body)));
        }

        let mut value: Value = serde_json::from_str(body)
            .map_err(|_| PanelError::api(format!("{OPAQUE_BODY} from {url}")))?;

        if let Some(error) = value.get("error") {
            if !error.is_null() {
                let detail = error
                    .as_str()
                    .map(str::to_string)
                    .or_else(|| {
                        error
                            .get("message")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| error.to_string());
                let kind = if ACTION_AUTH_ERRORS.contains(&detail.to_lowercase().as_str()) {
                    ErrorKind::Unauthorized
                } else {
                    ErrorKind::Api
                };
                return Err(PanelError::new(kind, format!("{detail} (from {url})")));
            }
        }

        // Unwrap up to two layers of {"data": ...} envelope.
        for _ in 0..2 {
            let unwrapped = match &value {
                Value::Object(map) if map.contains_key("data") => {
                    let meaningful = map.keys().filter(|k| *k != "meta" && *k != "status");
                    if meaningful.count() == 1 {
                        Some(map["data"].clone())
                    } else {
                        None
                    }
                }
                _ => None,
            };
            match unwrapped {
                Some(inner) => value = inner,
                None => break,
            }
        }

        Ok(value)
    }

    fn recognizes(&self, body: &str) -> bool {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => {
                map.contains_key("data") || map.contains_key("error") || map.contains_key("balance")
            }
            _ => false,
        }
    }
}

/// First bytes of a body for diagnostics; never the whole thing.
fn excerpt(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_status() -> StatusCode {
        StatusCode::OK
    }

    #[test]
    fn action_success_envelope_passes_through() {
        let body = json!({"status": "Completed", "charge": "1.20"}).to_string();
        let value = ActionDialect
            .parse_response(ok_status(), "https://p/api/v2", &body)
            .unwrap();
        assert_eq!(value["status"], "Completed");
    }

    #[test]
    fn action_error_envelope_is_error_despite_http_200() {
        let body = json!({"error": "Order not found"}).to_string();
        let err = ActionDialect
            .parse_response(ok_status(), "https://p/api/v2", &body)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Api);
        assert!(err.is_no_data());
    }

    #[test]
    fn action_bad_auth_token_classifies_unauthorized() {
        let body = json!({"error": "bad_auth"}).to_string();
        let err = ActionDialect
            .parse_response(ok_status(), "https://p/api/v2", &body)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[test]
    fn action_status_error_shape() {
        let body = json!({"status": "error", "message": "maintenance"}).to_string();
        let err = ActionDialect
            .parse_response(ok_status(), "https://p/api/v2", &body)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Api);
        assert!(err.message.contains("maintenance"));
    }

    #[test]
    fn action_html_body_is_opaque() {
        let err = ActionDialect
            .parse_response(ok_status(), "https://p/api/v2", "<html>challenge</html>")
            .unwrap_err();
        assert!(err.message.contains("unrecognizable"));
        assert!(!ActionDialect.recognizes("<html>challenge</html>"));
    }

    #[test]
    fn rest_unwraps_single_data_envelope() {
        let body = json!({"data": {"status": "completed"}}).to_string();
        let value = RestDialect
            .parse_response(ok_status(), "https://p/v2/orders/1", &body)
            .unwrap();
        assert_eq!(value["status"], "completed");
    }

    #[test]
    fn rest_unwraps_double_data_envelope() {
        let body = json!({"data": {"data": {"status": "partial"}}}).to_string();
        let value = RestDialect
            .parse_response(ok_status(), "https://p/v2/orders/1", &body)
            .unwrap();
        assert_eq!(value["status"], "partial");
    }

    #[test]
    fn rest_error_object_classified() {
        let body = json!({"error": {"message": "order missing"}}).to_string();
        let err = RestDialect
            .parse_response(ok_status(), "https://p/v2/orders/1", &body)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Api);
        assert!(err.message.contains("order missing"));
    }

    #[test]
    fn rest_http_404_is_not_found_with_diagnostics() {
        let err = RestDialect
            .parse_response(
                StatusCode::NOT_FOUND,
                "https://p/v2/orders/1",
                "not here",
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("/v2/orders/1"));
        assert!(err.message.contains("rest"));
    }

    #[test]
    fn probe_recognition_is_dialect_shaped() {
        assert!(ActionDialect.recognizes(r#"{"balance": "10.00", "currency": "USD"}"#));
        assert!(ActionDialect.recognizes(r#"{"error": "bad_auth"}"#));
        assert!(RestDialect.recognizes(r#"{"data": {"balance": 10}}"#));
        assert!(!RestDialect.recognizes("gateway timeout"));
    }
}
