//! The panel client: one instance serves every configured panel.
//!
//! Call path for a logical operation: resolve the dialect (configured, or
//! probed once and cached), take a throttle slot for the panel, then walk
//! the endpoint candidate chain accepting the first response that is not
//! itself an error envelope. The winning endpoint is remembered per panel
//! and tried first on subsequent calls.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use panelbot_types::{Panel, PanelDialectKind};

use crate::api::{OrderSnapshot, PanelApi};
use crate::dialect::{dialect_for, PanelDialect};
use crate::endpoints::{candidates, Candidate, Operation};
use crate::error::{ErrorKind, PanelError};
use crate::ratelimit::PanelThrottle;

/// Tuning knobs for the client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout. Timeouts classify as `Connection` and are
    /// never retried automatically.
    pub request_timeout: Duration,
    /// Per-panel requests per one-second window.
    pub requests_per_second: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            requests_per_second: 3,
        }
    }
}

impl ClientOptions {
    pub fn from_config(config: &panelbot_types::BotConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            requests_per_second: config.panel_requests_per_second,
        }
    }
}

pub struct PanelClient {
    http: Client,
    throttle: PanelThrottle,
    /// Probed dialects, keyed by panel id.
    dialects: Mutex<HashMap<String, PanelDialectKind>>,
    /// Winning endpoints from prior calls: (panel id, operation) → key.
    detected: Mutex<HashMap<(String, String), String>>,
}

impl PanelClient {
    pub fn new(options: ClientOptions) -> Result<Self, PanelError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(options.request_timeout)
            .user_agent("panelbot/0.1")
            .build()
            .map_err(|e| PanelError::api(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            throttle: PanelThrottle::new(options.requests_per_second),
            dialects: Mutex::new(HashMap::new()),
            detected: Mutex::new(HashMap::new()),
        })
    }

    /// Execute a logical operation against a panel, walking the endpoint
    /// candidate chain.
    pub async fn request(
        &self,
        panel: &Panel,
        op: Operation,
        params: &[(&str, String)],
    ) -> Result<Value, PanelError> {
        let dialect_kind = self.resolve_dialect(panel).await?;
        let dialect = dialect_for(dialect_kind);

        let chain = candidates(op, dialect_kind);
        if chain.is_empty() {
            return Err(PanelError::api(format!(
                "operation {op} has no endpoints under the {dialect_kind} dialect"
            )));
        }

        let mut last_err: Option<PanelError> = None;
        for candidate in self.ordered_candidates(panel, op, chain) {
            match self.send(dialect, panel, &candidate, params).await {
                Ok(value) => {
                    self.remember(panel, op, &candidate);
                    return Ok(value);
                }
                Err(err) if err.try_next_candidate() => {
                    debug!(
                        panel = %panel.id,
                        op = %op,
                        endpoint = %candidate.key(),
                        error = %err,
                        "candidate failed, trying next"
                    );
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        warn!(panel = %panel.id, op = %op, "endpoint chain exhausted");
        Err(last_err.unwrap_or_else(|| PanelError::api("endpoint chain exhausted")))
    }

    /// The dialect for a panel: explicit configuration wins, then a cached
    /// probe result, then a fresh probe.
    pub async fn resolve_dialect(&self, panel: &Panel) -> Result<PanelDialectKind, PanelError> {
        if let Some(kind) = panel.dialect {
            return Ok(kind);
        }
        if let Some(kind) = self
            .dialects
            .lock()
            .expect("dialect lock poisoned")
            .get(&panel.id)
            .copied()
        {
            return Ok(kind);
        }
        let kind = self.probe_dialect(panel).await?;
        self.dialects
            .lock()
            .expect("dialect lock poisoned")
            .insert(panel.id.clone(), kind);
        Ok(kind)
    }

    /// Probe which dialect a panel speaks by issuing each dialect's cheap
    /// balance read and accepting whichever returns a recognizable
    /// success/error envelope (an opaque transport error or an HTML
    /// challenge page identifies neither).
    async fn probe_dialect(&self, panel: &Panel) -> Result<PanelDialectKind, PanelError> {
        let mut last_err: Option<PanelError> = None;

        for kind in [PanelDialectKind::Action, PanelDialectKind::Rest] {
            let dialect = dialect_for(kind);
            let candidate = candidates(Operation::Balance, kind)[0];

            self.throttle.acquire(&panel.id).await;
            let (url, builder) = dialect.build_request(&self.http, panel, &candidate, &[]);
            let body = match builder.send().await {
                Ok(resp) => resp.text().await.unwrap_or_default(),
                Err(e) => {
                    last_err = Some(PanelError::from(e));
                    continue;
                }
            };

            if dialect.recognizes(&body) {
                debug!(panel = %panel.id, dialect = %kind, url = %url, "dialect detected");
                return Ok(kind);
            }
        }

        Err(last_err.unwrap_or_else(|| {
            PanelError::new(
                ErrorKind::Api,
                format!("panel {} answered neither dialect probe", panel.id),
            )
        }))
    }

    /// Candidates with any previously detected endpoint moved to the front.
    /// Panel-level configuration seeds the detection cache.
    fn ordered_candidates(
        &self,
        panel: &Panel,
        op: Operation,
        chain: &'static [Candidate],
    ) -> Vec<Candidate> {
        let detected_key = self
            .detected
            .lock()
            .expect("detected lock poisoned")
            .get(&(panel.id.clone(), op.as_str().to_string()))
            .cloned()
            .or_else(|| panel.detected_endpoints.get(op.as_str()).cloned());

        let mut ordered: Vec<Candidate> = chain.to_vec();
        if let Some(key) = detected_key {
            if let Some(pos) = ordered.iter().position(|c| c.key() == key) {
                let preferred = ordered.remove(pos);
                ordered.insert(0, preferred);
            }
        }
        ordered
    }

    fn remember(&self, panel: &Panel, op: Operation, candidate: &Candidate) {
        self.detected
            .lock()
            .expect("detected lock poisoned")
            .insert(
                (panel.id.clone(), op.as_str().to_string()),
                candidate.key(),
            );
    }

    /// Detected endpoints for a panel, for persisting back into its
    /// configuration.
    pub fn detected_endpoints(&self, panel_id: &str) -> HashMap<String, String> {
        self.detected
            .lock()
            .expect("detected lock poisoned")
            .iter()
            .filter(|((pid, _), _)| pid == panel_id)
            .map(|((_, op), key)| (op.clone(), key.clone()))
            .collect()
    }

    async fn send(
        &self,
        dialect: &dyn PanelDialect,
        panel: &Panel,
        candidate: &Candidate,
        params: &[(&str, String)],
    ) -> Result<Value, PanelError> {
        self.throttle.acquire(&panel.id).await;

        let (url, builder) = dialect.build_request(&self.http, panel, candidate, params);
        debug!(panel = %panel.id, url = %url, "panel request");

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        dialect.parse_response(status, &url, &body)
    }

    /// Discover the provider names visible on a panel.
    ///
    /// Action dialect only has reliable sources; four strategies are tried
    /// in order and each either yields data or is skipped. An empty result
    /// after all strategies is legitimate ("this panel has no visible
    /// providers"), distinguishable from hard failures which propagate.
    pub async fn providers(&self, panel: &Panel) -> Result<Vec<String>, PanelError> {
        let dialect_kind = self.resolve_dialect(panel).await?;

        let low_sample: Vec<String> = (0..10).map(|i| (1 + i * 50).to_string()).collect();
        let high_sample: Vec<String> = (1..=10).map(|i| (i * 1000).to_string()).collect();

        let strategies: Vec<(Operation, Vec<(&str, String)>)> = match dialect_kind {
            PanelDialectKind::Action => vec![
                (
                    Operation::Orders,
                    vec![("limit", "100".into()), ("provider", "1".into())],
                ),
                (Operation::ProviderData, vec![("orders", low_sample.join(","))]),
                (Operation::ProviderData, vec![("orders", high_sample.join(","))]),
                (Operation::Orders, vec![("limit", "100".into())]),
            ],
            // The RESTful dialect has a single listing endpoint.
            PanelDialectKind::Rest => vec![(Operation::Orders, vec![("limit", "100".into())])],
        };

        for (op, params) in strategies {
            match self.request(panel, op, &params).await {
                Ok(value) => {
                    let found = extract_providers(&value);
                    if !found.is_empty() {
                        return Ok(found);
                    }
                    debug!(panel = %panel.id, op = %op, "strategy yielded no providers, trying next");
                }
                Err(err) if err.is_no_data() || err.try_next_candidate() => {
                    debug!(panel = %panel.id, op = %op, error = %err, "strategy skipped");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Vec::new())
    }
}

/// Pull provider names out of a listing or provider-data payload.
/// Handles both an array of order objects and an id-keyed map.
fn extract_providers(value: &Value) -> Vec<String> {
    let items: Vec<&Value> = match value {
        Value::Array(arr) => arr.iter().collect(),
        Value::Object(map) => {
            if let Some(Value::Array(arr)) = map.get("orders").or_else(|| map.get("data")) {
                arr.iter().collect()
            } else {
                map.values().collect()
            }
        }
        _ => Vec::new(),
    };

    let mut providers: Vec<String> = Vec::new();
    for item in items {
        let name = item
            .get("provider")
            .or_else(|| item.get("provider_name"))
            .and_then(Value::as_str);
        if let Some(name) = name {
            if !name.is_empty() && !providers.iter().any(|p| p == name) {
                providers.push(name.to_string());
            }
        }
    }
    providers
}

#[async_trait]
impl PanelApi for PanelClient {
    async fn order_status(
        &self,
        panel: &Panel,
        external_id: &str,
    ) -> Result<OrderSnapshot, PanelError> {
        let value = self
            .request(panel, Operation::Status, &[("order", external_id.to_string())])
            .await?;
        Ok(OrderSnapshot::from_payload(value))
    }

    async fn refill(&self, panel: &Panel, external_id: &str) -> Result<Value, PanelError> {
        self.request(panel, Operation::Refill, &[("order", external_id.to_string())])
            .await
    }

    async fn cancel(&self, panel: &Panel, external_id: &str) -> Result<Value, PanelError> {
        self.request(panel, Operation::Cancel, &[("order", external_id.to_string())])
            .await
    }

    async fn speed_up(&self, panel: &Panel, external_id: &str) -> Result<Value, PanelError> {
        self.request(panel, Operation::SpeedUp, &[("order", external_id.to_string())])
            .await
    }

    async fn balance(&self, panel: &Panel) -> Result<f64, PanelError> {
        let value = self.request(panel, Operation::Balance, &[]).await?;
        value
            .get("balance")
            .and_then(|b| match b {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .ok_or_else(|| PanelError::api("balance missing from response"))
    }
}
