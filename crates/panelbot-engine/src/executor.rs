//! Per-order command execution.
//!
//! One `execute` call runs the full pipeline for a single order id:
//! resolve (or materialize) the order, refresh its status from the panel,
//! run the authorization chain, enforce the command's precondition, then
//! branch on the configured action mode. Every mutating attempt leaves
//! exactly one terminal command record; every successful one leaves one
//! cooldown.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use panelbot_auth::{AuthChain, AuthDeps, AuthOutcome, AuthRequest};
use panelbot_panel::{PanelApi, PanelError};
use panelbot_store::{
    ClaimResult, CommandStore, CooldownStore, MappingStore, OrderStore, PolicyStore, RateLimiter,
    SlidingWindowLimiter, StoreError,
};
use panelbot_types::{
    ActionMode, CommandKind, CommandRecord, Cooldown, Order, OrderOutcome, Panel, PendingInput,
    UserMapping,
};

use crate::forward::{ForwardError, ForwardRequest, OperatorForwarder};
use crate::guarantee::{GuaranteeCheck, GuaranteeVerdict, KeywordGuarantee};
use crate::messages;

/// The storage collaborators, one handle per concern.
#[derive(Clone)]
pub struct Stores {
    pub orders: Arc<dyn OrderStore>,
    pub commands: Arc<dyn CommandStore>,
    pub cooldowns: Arc<dyn CooldownStore>,
    pub mappings: Arc<dyn MappingStore>,
    pub policies: Arc<dyn PolicyStore>,
}

impl Stores {
    /// Wire every handle to one shared backing store (the usual case).
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: OrderStore + CommandStore + CooldownStore + MappingStore + PolicyStore + 'static,
    {
        Self {
            orders: store.clone(),
            commands: store.clone(),
            cooldowns: store.clone(),
            mappings: store.clone(),
            policies: store,
        }
    }
}

/// One order id's worth of work.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub order_id: String,
    pub kind: CommandKind,
    pub sender_id: String,
    /// The reseller account whose panels and policy apply.
    pub reseller_id: String,
    pub is_group: bool,
    pub group_id: Option<String>,
    /// Restrict order materialization to this panel.
    pub panel_hint: Option<String>,
    pub staff_override: bool,
    /// Username collected by a pending-conversation resume.
    pub supplied_username: Option<String>,
}

pub struct Executor {
    stores: Stores,
    panel_api: Arc<dyn PanelApi>,
    panels: Vec<Panel>,
    chain: AuthChain,
    limiter: Arc<dyn RateLimiter>,
    guarantee: Arc<dyn GuaranteeCheck>,
    forwarder: Option<Arc<dyn OperatorForwarder>>,
}

impl Executor {
    pub fn new(stores: Stores, panel_api: Arc<dyn PanelApi>, panels: Vec<Panel>) -> Self {
        Self {
            stores,
            panel_api,
            panels,
            chain: AuthChain::standard(),
            limiter: Arc::new(SlidingWindowLimiter::new()),
            guarantee: Arc::new(KeywordGuarantee),
            forwarder: None,
        }
    }

    pub fn with_forwarder(mut self, forwarder: Arc<dyn OperatorForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    pub fn with_guarantee(mut self, guarantee: Arc<dyn GuaranteeCheck>) -> Self {
        self.guarantee = guarantee;
        self
    }

    pub fn with_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// The mapping registered for a sender identifier, if any.
    pub fn mapping_for(&self, identifier: &str) -> Result<Option<UserMapping>, StoreError> {
        self.stores.mappings.find_mapping(identifier)
    }

    /// Execute one command for one order id. Never panics and never
    /// returns `Err`: store failures become a generic internal-error
    /// outcome so a bulk run can keep going.
    pub async fn execute(&self, req: &ExecRequest) -> OrderOutcome {
        match self.execute_inner(req).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    order = %req.order_id,
                    command = %req.kind,
                    error = %err,
                    "internal error during command execution"
                );
                OrderOutcome::failed(&req.order_id, messages::internal_error())
            }
        }
    }

    async fn execute_inner(&self, req: &ExecRequest) -> Result<OrderOutcome, StoreError> {
        // 1. Resolve locally, else materialize from the panels.
        let (mut order, just_fetched) = match self.stores.orders.get_order(&req.order_id)? {
            Some(order) => (order, false),
            None => match self.materialize(req).await? {
                Some(order) => (order, true),
                None => {
                    return Ok(OrderOutcome::failed(
                        &req.order_id,
                        messages::order_not_found(&req.order_id),
                    ))
                }
            },
        };

        // 2. Refresh from the panel: the local copy is a cache. Skipped
        // when the order was fetched this call, and when an active
        // cooldown is about to deny anyway (no call needed to refuse).
        let cooldown_pending = req.kind.is_mutating()
            && self
                .stores
                .cooldowns
                .active_cooldown(&order.external_id, req.kind, Utc::now())?
                .is_some();

        if !just_fetched && !cooldown_pending {
            self.refresh(&mut order).await?;
        }

        // 3. Authorization chain.
        let policy = self.stores.policies.policy_for(&order.user_id)?;
        let outcome = self.chain.authorize(
            AuthRequest {
                order: &order,
                sender_id: &req.sender_id,
                is_group: req.is_group,
                group_id: req.group_id.as_deref(),
                command: req.kind,
                policy: &policy,
                staff_override: req.staff_override,
                supplied_username: req.supplied_username.as_deref(),
            },
            AuthDeps {
                mappings: self.stores.mappings.as_ref(),
                cooldowns: self.stores.cooldowns.as_ref(),
                limiter: self.limiter.as_ref(),
            },
        );

        match outcome {
            AuthOutcome::Deny { message } => {
                return Ok(OrderOutcome::failed(&order.external_id, message))
            }
            AuthOutcome::NeedsRegistration => {
                return Ok(OrderOutcome::failed(
                    &order.external_id,
                    messages::registration_prompt(),
                )
                .with_pending(PendingInput::Registration))
            }
            AuthOutcome::NeedsUsernameVerification { expected_username } => {
                return Ok(OrderOutcome::failed(
                    &order.external_id,
                    messages::username_prompt(&order.external_id),
                )
                .with_pending(PendingInput::UsernameVerification { expected_username }))
            }
            AuthOutcome::Allow {
                should_claim,
                fallback,
            } => {
                if fallback {
                    warn!(
                        order = %order.external_id,
                        sender = %req.sender_id,
                        "ownership not verified (customer username unavailable), proceeding on fallback"
                    );
                }
                if should_claim {
                    match self.stores.orders.claim_order(
                        &order.external_id,
                        &req.sender_id,
                        !fallback,
                    )? {
                        ClaimResult::Claimed => {
                            order.claim(&req.sender_id, !fallback);
                        }
                        ClaimResult::HeldByOther => {
                            // Lost the claim race since authorization ran.
                            return Ok(OrderOutcome::failed(
                                &order.external_id,
                                panelbot_auth::messages::claimed_by_other(&order.external_id),
                            ));
                        }
                        ClaimResult::NotFound => {
                            return Ok(OrderOutcome::failed(
                                &order.external_id,
                                messages::internal_error(),
                            ))
                        }
                    }
                }
            }
        }

        // 4. Status is read-only: report and stop.
        if req.kind == CommandKind::Status {
            let details = serde_json::to_value(&order).unwrap_or(Value::Null);
            return Ok(
                OrderOutcome::ok(&order.external_id, messages::status_line(&order))
                    .with_details(details),
            );
        }

        // Precondition per command.
        if let Some(outcome) = self.check_precondition(req.kind, &order) {
            return Ok(outcome);
        }

        // 5. Action mode branch, with the audit record around it.
        let mode = policy.action_mode(req.kind);
        if mode == ActionMode::Disabled {
            return Ok(OrderOutcome::failed(
                &order.external_id,
                messages::command_disabled(req.kind),
            ));
        }

        let mut record = CommandRecord::open(&order.external_id, req.kind, &req.sender_id);
        self.stores.commands.insert_command(record.clone())?;

        let api_result = match mode {
            ActionMode::Auto | ActionMode::Both => Some(self.call_panel(req.kind, &order).await),
            _ => None,
        };
        let forward_result = match mode {
            ActionMode::Forward | ActionMode::Both => Some(self.forward(req.kind, &order, req).await),
            _ => None,
        };

        let api_ok = matches!(api_result, Some(Ok(_)));
        let forward_ok = matches!(forward_result, Some(Ok(())));
        let success = api_ok || forward_ok;

        if success {
            let payload = match &api_result {
                Some(Ok(value)) => value.clone(),
                _ => json!({ "forwarded": true }),
            };
            if let Err(err) = record.succeed(payload.clone()) {
                warn!(record = %err.id, "command record finalized twice");
            }
            self.stores.commands.update_command(record)?;

            // 6. One cooldown per successful non-status command.
            self.stores.cooldowns.put_cooldown(Cooldown::for_seconds(
                &order.external_id,
                req.kind,
                policy.command_cooldown_secs,
            ))?;

            let message = if api_ok {
                messages::submitted(req.kind, &order.external_id)
            } else {
                messages::forwarded(req.kind, &order.external_id)
            };
            return Ok(OrderOutcome::ok(&order.external_id, message).with_details(payload));
        }

        // Failure: attach whatever went wrong to the record, reply with
        // the sanitized phrase.
        let (error_text, user_message) = match (&api_result, &forward_result) {
            (Some(Err(api_err)), _) => (
                api_err.to_string(),
                messages::upstream_error(api_err.kind, &order.external_id),
            ),
            (None, Some(Err(fwd_err))) => (fwd_err.to_string(), messages::operator_unavailable()),
            _ => ("no execution path configured".to_string(), messages::internal_error()),
        };
        if let Err(err) = record.fail(error_text) {
            warn!(record = %err.id, "command record finalized twice");
        }
        self.stores.commands.update_command(record)?;

        Ok(OrderOutcome::failed(&order.external_id, user_message))
    }

    /// Fetch an unknown order from the panels, admin/status endpoint
    /// fallback handled by the client. The first panel that answers wins;
    /// a hint restricts the search to that panel.
    async fn materialize(&self, req: &ExecRequest) -> Result<Option<Order>, StoreError> {
        for panel in self.panels.iter().filter(|p| {
            req.panel_hint
                .as_deref()
                .map_or(true, |hint| hint == p.id)
        }) {
            match self.panel_api.order_status(panel, &req.order_id).await {
                Ok(snapshot) => {
                    let mut order = Order::new(&req.order_id, &req.reseller_id, &panel.id);
                    snapshot.apply_to(&mut order);
                    self.stores.orders.upsert_order(order.clone())?;
                    debug!(order = %req.order_id, panel = %panel.id, "order materialized");
                    return Ok(Some(order));
                }
                Err(err) => {
                    debug!(
                        order = %req.order_id,
                        panel = %panel.id,
                        error = %err,
                        "order not found on panel"
                    );
                }
            }
        }
        Ok(None)
    }

    /// Refresh a cached order. Errors are swallowed: the panel may be
    /// briefly unreachable and a stale status is better than no answer.
    async fn refresh(&self, order: &mut Order) -> Result<(), StoreError> {
        let panel = match self.panels.iter().find(|p| p.id == order.panel_id) {
            Some(p) => p,
            None => {
                warn!(order = %order.external_id, panel = %order.panel_id, "panel not configured, skipping refresh");
                return Ok(());
            }
        };

        match self.panel_api.order_status(panel, &order.external_id).await {
            Ok(snapshot) => {
                snapshot.apply_to(order);
                self.stores.orders.upsert_order(order.clone())?;
            }
            Err(err) => {
                warn!(
                    order = %order.external_id,
                    error = %err,
                    "status refresh failed, continuing with cached status"
                );
            }
        }
        Ok(())
    }

    fn check_precondition(&self, kind: CommandKind, order: &Order) -> Option<OrderOutcome> {
        let id = &order.external_id;
        match kind {
            CommandKind::Refill => {
                if !order.status.refillable() {
                    return Some(OrderOutcome::failed(
                        id,
                        messages::wrong_status_for_refill(id, &order.status),
                    ));
                }
                match self.guarantee.check(order) {
                    GuaranteeVerdict::Eligible => None,
                    GuaranteeVerdict::NoGuarantee => {
                        Some(OrderOutcome::failed(id, messages::no_guarantee(id)))
                    }
                    GuaranteeVerdict::Expired { window_days } => Some(OrderOutcome::failed(
                        id,
                        messages::guarantee_expired(id, window_days),
                    )),
                    GuaranteeVerdict::Custom(text) => Some(OrderOutcome::failed(id, text)),
                }
            }
            CommandKind::Cancel => (!order.status.cancellable()).then(|| {
                OrderOutcome::failed(id, messages::wrong_status_for_cancel(id, &order.status))
            }),
            CommandKind::SpeedUp => (!order.status.speedable()).then(|| {
                OrderOutcome::failed(id, messages::wrong_status_for_speed_up(id, &order.status))
            }),
            CommandKind::Status => None,
        }
    }

    async fn call_panel(&self, kind: CommandKind, order: &Order) -> Result<Value, PanelError> {
        let panel = self
            .panels
            .iter()
            .find(|p| p.id == order.panel_id)
            .ok_or_else(|| {
                PanelError::api(format!("panel '{}' is not configured", order.panel_id))
            })?;

        match kind {
            CommandKind::Refill => self.panel_api.refill(panel, &order.external_id).await,
            CommandKind::Cancel => self.panel_api.cancel(panel, &order.external_id).await,
            CommandKind::SpeedUp => self.panel_api.speed_up(panel, &order.external_id).await,
            CommandKind::Status => Err(PanelError::api("status is read-only")),
        }
    }

    async fn forward(
        &self,
        kind: CommandKind,
        order: &Order,
        req: &ExecRequest,
    ) -> Result<(), ForwardError> {
        match &self.forwarder {
            Some(forwarder) => {
                forwarder
                    .forward(ForwardRequest::for_order(order, kind, &req.sender_id))
                    .await
            }
            None => Err(ForwardError::NotConfigured),
        }
    }
}
