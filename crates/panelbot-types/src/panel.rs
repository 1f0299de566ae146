//! External panel definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The two incompatible API conventions found across panel deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelDialectKind {
    /// Query-string `key=…&action=…` API with `{status, error}` JSON bodies.
    Action,
    /// Header-authenticated RESTful API with resource-path endpoints.
    Rest,
}

impl std::fmt::Display for PanelDialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelDialectKind::Action => write!(f, "action"),
            PanelDialectKind::Rest => write!(f, "rest"),
        }
    }
}

/// One external panel: base URL, credential, and dialect knowledge.
///
/// Read-only from the pipeline's perspective except for endpoint
/// auto-detection writes into `detected_endpoints`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    /// Configured dialect; `None` means detect at runtime with a probe.
    pub dialect: Option<PanelDialectKind>,
    /// Endpoint overrides persisted from prior successful calls, keyed by
    /// logical operation name ("refill", "cancel", "status", ...).
    #[serde(default)]
    pub detected_endpoints: HashMap<String, String>,
}

impl Panel {
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            base_url: base_url.into(),
            api_key: api_key.into(),
            dialect: None,
            detected_endpoints: HashMap::new(),
        }
    }

    pub fn with_dialect(mut self, dialect: PanelDialectKind) -> Self {
        self.dialect = Some(dialect);
        self
    }
}
