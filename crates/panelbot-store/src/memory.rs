//! In-memory store backing single-instance deployments and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use panelbot_types::{
    CommandKind, CommandRecord, Cooldown, Order, SecurityPolicy, UserMapping,
};

use crate::traits::{
    ClaimResult, CommandStore, CooldownStore, MappingStore, OrderStore, PolicyStore, StoreError,
};

/// One mutex-guarded map per entity. Claim writes happen under the order
/// lock, which is what makes first-claim-wins atomic here.
pub struct MemoryStore {
    orders: Mutex<HashMap<String, Order>>,
    commands: Mutex<HashMap<Uuid, CommandRecord>>,
    cooldowns: Mutex<HashMap<(String, CommandKind), Cooldown>>,
    mappings: Mutex<Vec<UserMapping>>,
    policies: Mutex<HashMap<String, SecurityPolicy>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
            commands: Mutex::new(HashMap::new()),
            cooldowns: Mutex::new(HashMap::new()),
            mappings: Mutex::new(Vec::new()),
            policies: Mutex::new(HashMap::new()),
        }
    }

    fn lock<'a, T>(m: &'a Mutex<T>) -> Result<std::sync::MutexGuard<'a, T>, StoreError> {
        m.lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore for MemoryStore {
    fn get_order(&self, external_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(Self::lock(&self.orders)?.get(external_id).cloned())
    }

    fn upsert_order(&self, order: Order) -> Result<(), StoreError> {
        Self::lock(&self.orders)?.insert(order.external_id.clone(), order);
        Ok(())
    }

    fn claim_order(
        &self,
        external_id: &str,
        sender: &str,
        verified: bool,
    ) -> Result<ClaimResult, StoreError> {
        let mut orders = Self::lock(&self.orders)?;
        match orders.get_mut(external_id) {
            None => Ok(ClaimResult::NotFound),
            Some(order) => {
                if order.claim(sender, verified) {
                    Ok(ClaimResult::Claimed)
                } else {
                    Ok(ClaimResult::HeldByOther)
                }
            }
        }
    }
}

impl CommandStore for MemoryStore {
    fn insert_command(&self, record: CommandRecord) -> Result<(), StoreError> {
        let mut commands = Self::lock(&self.commands)?;
        if commands.contains_key(&record.id) {
            return Err(StoreError::Conflict(format!(
                "command record {} already exists",
                record.id
            )));
        }
        commands.insert(record.id, record);
        Ok(())
    }

    fn update_command(&self, record: CommandRecord) -> Result<(), StoreError> {
        let mut commands = Self::lock(&self.commands)?;
        match commands.get(&record.id) {
            None => Err(StoreError::Conflict(format!(
                "command record {} does not exist",
                record.id
            ))),
            Some(existing) if existing.status.is_terminal() => Err(StoreError::Conflict(format!(
                "command record {} is already terminal",
                record.id
            ))),
            Some(_) => {
                commands.insert(record.id, record);
                Ok(())
            }
        }
    }

    fn get_command(&self, id: Uuid) -> Result<Option<CommandRecord>, StoreError> {
        Ok(Self::lock(&self.commands)?.get(&id).cloned())
    }

    fn commands_for_order(
        &self,
        external_id: &str,
        kind: Option<CommandKind>,
    ) -> Result<Vec<CommandRecord>, StoreError> {
        let commands = Self::lock(&self.commands)?;
        let mut matching: Vec<CommandRecord> = commands
            .values()
            .filter(|r| r.order_external_id == external_id)
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching)
    }
}

impl CooldownStore for MemoryStore {
    fn active_cooldown(
        &self,
        external_id: &str,
        kind: CommandKind,
        now: DateTime<Utc>,
    ) -> Result<Option<Cooldown>, StoreError> {
        let cooldowns = Self::lock(&self.cooldowns)?;
        Ok(cooldowns
            .get(&(external_id.to_string(), kind))
            .filter(|cd| !cd.is_expired(now))
            .cloned())
    }

    fn put_cooldown(&self, cooldown: Cooldown) -> Result<(), StoreError> {
        let mut cooldowns = Self::lock(&self.cooldowns)?;
        cooldowns.insert(
            (cooldown.order_external_id.clone(), cooldown.kind),
            cooldown,
        );
        Ok(())
    }
}

impl MappingStore for MemoryStore {
    fn find_mapping(&self, identifier: &str) -> Result<Option<UserMapping>, StoreError> {
        let mappings = Self::lock(&self.mappings)?;
        Ok(mappings.iter().find(|m| m.covers(identifier)).cloned())
    }

    fn upsert_mapping(&self, mapping: UserMapping) -> Result<(), StoreError> {
        let mut mappings = Self::lock(&self.mappings)?;
        // Mappings are keyed by panel username; replace in place.
        if let Some(existing) = mappings
            .iter_mut()
            .find(|m| m.panel_username == mapping.panel_username)
        {
            *existing = mapping;
        } else {
            mappings.push(mapping);
        }
        Ok(())
    }
}

impl PolicyStore for MemoryStore {
    fn policy_for(&self, user_id: &str) -> Result<SecurityPolicy, StoreError> {
        let mut policies = Self::lock(&self.policies)?;
        Ok(policies
            .entry(user_id.to_string())
            .or_insert_with(SecurityPolicy::default)
            .clone())
    }

    fn put_policy(&self, user_id: &str, policy: SecurityPolicy) -> Result<(), StoreError> {
        Self::lock(&self.policies)?.insert(user_id.to_string(), policy);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_first_wins_and_idempotent() {
        let store = MemoryStore::new();
        store
            .upsert_order(Order::new("12345", "reseller-1", "panel-1"))
            .unwrap();

        assert_eq!(
            store.claim_order("12345", "628111", true).unwrap(),
            ClaimResult::Claimed
        );
        assert_eq!(
            store.claim_order("12345", "628111", true).unwrap(),
            ClaimResult::Claimed,
            "repeat claim by the same sender is a no-op"
        );
        assert_eq!(
            store.claim_order("12345", "628999", true).unwrap(),
            ClaimResult::HeldByOther
        );
        assert_eq!(
            store.claim_order("99999", "628111", true).unwrap(),
            ClaimResult::NotFound
        );

        let order = store.get_order("12345").unwrap().unwrap();
        assert_eq!(order.claimed_by.as_deref(), Some("628111"));
    }

    #[test]
    fn terminal_command_records_reject_updates() {
        let store = MemoryStore::new();
        let mut rec = CommandRecord::open("12345", CommandKind::Refill, "628111");
        let id = rec.id;
        store.insert_command(rec.clone()).unwrap();

        rec.succeed(serde_json::json!({"ok": true})).unwrap();
        store.update_command(rec.clone()).unwrap();

        // A second finalization attempt must be rejected by the store too.
        let mut again = store.get_command(id).unwrap().unwrap();
        again.error = Some("rewrite attempt".into());
        assert!(matches!(
            store.update_command(again),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn cooldown_expiry_filters_lookup() {
        let store = MemoryStore::new();
        let cd = Cooldown::for_seconds("12345", CommandKind::Refill, 300);
        store.put_cooldown(cd).unwrap();

        let now = Utc::now();
        assert!(store
            .active_cooldown("12345", CommandKind::Refill, now)
            .unwrap()
            .is_some());
        // A different command kind has no cooldown.
        assert!(store
            .active_cooldown("12345", CommandKind::Cancel, now)
            .unwrap()
            .is_none());

        let later = now + chrono::Duration::seconds(301);
        assert!(store
            .active_cooldown("12345", CommandKind::Refill, later)
            .unwrap()
            .is_none());
    }

    #[test]
    fn mapping_found_by_any_identifier() {
        let store = MemoryStore::new();
        let mut m = UserMapping::new("628111", "reseller_a");
        m.identifiers.push("group-9".into());
        store.upsert_mapping(m).unwrap();

        assert!(store.find_mapping("628111").unwrap().is_some());
        assert!(store.find_mapping("group-9").unwrap().is_some());
        assert!(store.find_mapping("628000").unwrap().is_none());
    }

    #[test]
    fn policy_created_with_defaults_on_first_access() {
        let store = MemoryStore::new();
        let p = store.policy_for("reseller-1").unwrap();
        assert_eq!(p, SecurityPolicy::default());

        let mut custom = SecurityPolicy::default();
        custom.max_commands_per_minute = 99;
        store.put_policy("reseller-1", custom.clone()).unwrap();
        assert_eq!(store.policy_for("reseller-1").unwrap(), custom);
    }

    #[test]
    fn commands_for_order_filters_by_kind() {
        let store = MemoryStore::new();
        store
            .insert_command(CommandRecord::open("111", CommandKind::Refill, "s"))
            .unwrap();
        store
            .insert_command(CommandRecord::open("111", CommandKind::Cancel, "s"))
            .unwrap();
        store
            .insert_command(CommandRecord::open("222", CommandKind::Refill, "s"))
            .unwrap();

        assert_eq!(store.commands_for_order("111", None).unwrap().len(), 2);
        assert_eq!(
            store
                .commands_for_order("111", Some(CommandKind::Refill))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(store.commands_for_order("333", None).unwrap().len(), 0);
    }
}
