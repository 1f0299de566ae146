//! Shared fixtures for the end-to-end pipeline tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use panelbot::engine::{Executor, Pipeline, Stores};
use panelbot::panel::{OrderSnapshot, PanelApi, PanelError};
use panelbot::store::{MappingStore, MemoryStore, OrderStore};
use panelbot::types::{InboundMessage, Order, OrderStatus, Panel, Platform, UserMapping};

pub const RESELLER: &str = "reseller-1";
pub const PANEL_ID: &str = "panel-1";
pub const ALICE_PHONE: &str = "628111";

/// Initialize tracing once for the whole test binary. Set RUST_LOG to see
/// pipeline decisions while debugging a failing scenario.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Scripted panel double counting calls per operation. Status responses
/// can be scripted per order id; unknown ids get the default payload.
pub struct MockPanel {
    pub default_payload: Mutex<Value>,
    pub per_order: Mutex<std::collections::HashMap<String, Value>>,
    pub fail_mutations: bool,
    pub status_calls: AtomicUsize,
    pub refill_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub speed_up_calls: AtomicUsize,
}

impl MockPanel {
    pub fn new(default_payload: Value) -> Self {
        Self {
            default_payload: Mutex::new(default_payload),
            per_order: Mutex::new(std::collections::HashMap::new()),
            fail_mutations: false,
            status_calls: AtomicUsize::new(0),
            refill_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            speed_up_calls: AtomicUsize::new(0),
        }
    }

    pub fn completed() -> Self {
        Self::new(json!({
            "status": "Completed",
            "service": "Followers [30 Days Refill]",
            "username": "alice",
        }))
    }

    pub fn script_order(&self, external_id: &str, payload: Value) {
        self.per_order
            .lock()
            .unwrap()
            .insert(external_id.to_string(), payload);
    }
}

#[async_trait]
impl PanelApi for MockPanel {
    async fn order_status(
        &self,
        _panel: &Panel,
        external_id: &str,
    ) -> Result<OrderSnapshot, PanelError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let payload = self
            .per_order
            .lock()
            .unwrap()
            .get(external_id)
            .cloned()
            .unwrap_or_else(|| self.default_payload.lock().unwrap().clone());
        Ok(OrderSnapshot::from_payload(payload))
    }

    async fn refill(&self, _panel: &Panel, _id: &str) -> Result<Value, PanelError> {
        self.refill_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations {
            Err(PanelError::api("mutation rejected"))
        } else {
            Ok(json!({"refill": "1"}))
        }
    }

    async fn cancel(&self, _panel: &Panel, _id: &str) -> Result<Value, PanelError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations {
            Err(PanelError::api("mutation rejected"))
        } else {
            Ok(json!({"cancel": "1"}))
        }
    }

    async fn speed_up(&self, _panel: &Panel, _id: &str) -> Result<Value, PanelError> {
        self.speed_up_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"speedup": "1"}))
    }

    async fn balance(&self, _panel: &Panel) -> Result<f64, PanelError> {
        Ok(100.0)
    }
}

/// Store + mock panel + pipeline wired together.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub panel: Arc<MockPanel>,
    pub pipeline: Pipeline,
}

pub fn harness(panel: MockPanel) -> Harness {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let panel = Arc::new(panel);
    let executor = Executor::new(
        Stores::from_shared(store.clone()),
        panel.clone(),
        vec![Panel::new(PANEL_ID, "https://p.example.com", "k-test")],
    );
    Harness {
        store,
        panel,
        pipeline: Pipeline::new(executor, RESELLER),
    }
}

/// Seed a claimed, completed, refill-guaranteed order owned by alice.
pub fn seed_claimed_completed_order(store: &MemoryStore, external_id: &str) {
    let mut order = Order::new(external_id, RESELLER, PANEL_ID);
    order.customer_username = Some("alice".into());
    order.service_name = Some("Followers [30 Days Refill]".into());
    order.apply_status(OrderStatus::Completed);
    order.claim(ALICE_PHONE, true);
    store.upsert_order(order).unwrap();
}

/// Seed an in-progress order owned by alice.
pub fn seed_in_progress_order(store: &MemoryStore, external_id: &str) {
    let mut order = Order::new(external_id, RESELLER, PANEL_ID);
    order.customer_username = Some("alice".into());
    order.apply_status(OrderStatus::InProgress);
    store.upsert_order(order).unwrap();
}

/// Register alice's phone number against her panel username.
pub fn register_alice(store: &MemoryStore) {
    store
        .upsert_mapping(UserMapping::new(ALICE_PHONE, "alice"))
        .unwrap();
}

pub fn dm(text: &str) -> InboundMessage {
    InboundMessage::dm(ALICE_PHONE, text, Platform::Whatsapp)
}

pub fn dm_from(sender: &str, text: &str) -> InboundMessage {
    InboundMessage::dm(sender, text, Platform::Whatsapp)
}
