//! Logical operations and per-dialect endpoint candidate chains.
//!
//! Several operations have no single guaranteed endpoint across panel
//! deployments. Each (operation, dialect) pair carries an ordered list of
//! candidates; the client tries them in order and remembers the winner.

use panelbot_types::PanelDialectKind;

/// Logical operations the client can perform against a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Status,
    Refill,
    Cancel,
    SpeedUp,
    Balance,
    /// Bulk order listing (provider discovery).
    Orders,
    /// Mass provider-data lookup (provider discovery, action dialect only).
    ProviderData,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Status => "status",
            Operation::Refill => "refill",
            Operation::Cancel => "cancel",
            Operation::SpeedUp => "speedup",
            Operation::Balance => "balance",
            Operation::Orders => "orders",
            Operation::ProviderData => "provider_data",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One endpoint guess: HTTP method, path (REST paths may contain `{id}`),
/// and the `action` parameter for the action dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub method: &'static str,
    pub path: &'static str,
    pub action: Option<&'static str>,
}

impl Candidate {
    const fn act(path: &'static str, action: &'static str) -> Self {
        Self {
            method: "POST",
            path,
            action: Some(action),
        }
    }

    const fn rest(method: &'static str, path: &'static str) -> Self {
        Self {
            method,
            path,
            action: None,
        }
    }

    /// Stable key used to persist a detected endpoint per panel.
    pub fn key(&self) -> String {
        match self.action {
            Some(action) => format!("{} {}?action={}", self.method, self.path, action),
            None => format!("{} {}", self.method, self.path),
        }
    }
}

// Admin API paths go first: they expose provider fields the public API
// hides, and resolution falls back to the public path when absent.
const ACTION_STATUS: &[Candidate] = &[
    Candidate::act("/adminapi/v2", "status"),
    Candidate::act("/api/v2", "status"),
    Candidate::act("/api/v2", "orderstatus"),
];
const ACTION_REFILL: &[Candidate] = &[
    Candidate::act("/adminapi/v2", "refill"),
    Candidate::act("/api/v2", "refill"),
    Candidate::act("/api/v2", "refill_order"),
];
const ACTION_CANCEL: &[Candidate] = &[
    Candidate::act("/adminapi/v2", "cancel"),
    Candidate::act("/api/v2", "cancel"),
    Candidate::act("/api/v2", "cancel_order"),
];
const ACTION_SPEEDUP: &[Candidate] = &[
    Candidate::act("/adminapi/v2", "speedup"),
    Candidate::act("/api/v2", "speedup"),
    Candidate::act("/api/v2", "speed_up"),
];
const ACTION_BALANCE: &[Candidate] = &[
    Candidate::act("/api/v2", "balance"),
    Candidate::act("/adminapi/v2", "balance"),
];
const ACTION_ORDERS: &[Candidate] = &[
    Candidate::act("/adminapi/v2", "orders"),
    Candidate::act("/api/v2", "orders"),
];
const ACTION_PROVIDER_DATA: &[Candidate] = &[
    Candidate::act("/adminapi/v2", "providers_data"),
    Candidate::act("/adminapi/v2", "getProvidersData"),
];

const REST_STATUS: &[Candidate] = &[
    Candidate::rest("GET", "/v2/orders/{id}"),
    Candidate::rest("GET", "/v1/orders/{id}"),
];
const REST_REFILL: &[Candidate] = &[
    Candidate::rest("POST", "/v2/orders/{id}/refill"),
    Candidate::rest("POST", "/v1/orders/{id}/refill"),
];
const REST_CANCEL: &[Candidate] = &[
    Candidate::rest("POST", "/v2/orders/{id}/cancel"),
    Candidate::rest("POST", "/v1/orders/{id}/cancel"),
];
const REST_SPEEDUP: &[Candidate] = &[Candidate::rest("POST", "/v2/orders/{id}/speedup")];
const REST_BALANCE: &[Candidate] = &[
    Candidate::rest("GET", "/v2/balance"),
    Candidate::rest("GET", "/v1/balance"),
];
const REST_ORDERS: &[Candidate] = &[Candidate::rest("GET", "/v2/orders")];

/// Ordered candidates for an operation under a dialect.
pub fn candidates(op: Operation, dialect: PanelDialectKind) -> &'static [Candidate] {
    match dialect {
        PanelDialectKind::Action => match op {
            Operation::Status => ACTION_STATUS,
            Operation::Refill => ACTION_REFILL,
            Operation::Cancel => ACTION_CANCEL,
            Operation::SpeedUp => ACTION_SPEEDUP,
            Operation::Balance => ACTION_BALANCE,
            Operation::Orders => ACTION_ORDERS,
            Operation::ProviderData => ACTION_PROVIDER_DATA,
        },
        PanelDialectKind::Rest => match op {
            Operation::Status => REST_STATUS,
            Operation::Refill => REST_REFILL,
            Operation::Cancel => REST_CANCEL,
            Operation::SpeedUp => REST_SPEEDUP,
            Operation::Balance => REST_BALANCE,
            Operation::Orders => REST_ORDERS,
            Operation::ProviderData => &[],
        },
    }
}
