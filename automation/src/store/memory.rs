// In-memory automation store for tests and single-process embedding

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use propel_shared::{AutomationRule, EventKind, NewNotification, Notification, WebhookSubscription};
use uuid::Uuid;

use super::{AutomationStore, StoreError, StoreResult};

/// `Vec`-backed [`AutomationStore`] with the same filtering semantics as the
/// Postgres store. The `fail_*` switches make individual calls return
/// [`StoreError::Unavailable`] so callers' degraded paths can be exercised.
#[derive(Default)]
pub struct MemoryAutomationStore {
    rules: Mutex<Vec<AutomationRule>>,
    subscriptions: Mutex<Vec<WebhookSubscription>>,
    notifications: Mutex<Vec<Notification>>,
    fail_automation_lookups: AtomicBool,
    fail_webhook_lookups: AtomicBool,
    fail_notification_inserts: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryAutomationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&self, rule: AutomationRule) {
        lock(&self.rules).push(rule);
    }

    pub fn add_subscription(&self, subscription: WebhookSubscription) {
        lock(&self.subscriptions).push(subscription);
    }

    pub fn set_rule_enabled(&self, rule_id: Uuid, enabled: bool) {
        for rule in lock(&self.rules).iter_mut() {
            if rule.id == rule_id {
                rule.is_enabled = enabled;
                rule.updated_at = Some(Utc::now());
            }
        }
    }

    pub fn set_subscription_active(&self, subscription_id: Uuid, active: bool) {
        for subscription in lock(&self.subscriptions).iter_mut() {
            if subscription.id == subscription_id {
                subscription.is_active = active;
            }
        }
    }

    /// Snapshot of everything inserted so far.
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.notifications).clone()
    }

    pub fn fail_automation_lookups(&self, fail: bool) {
        self.fail_automation_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_webhook_lookups(&self, fail: bool) {
        self.fail_webhook_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_notification_inserts(&self, fail: bool) {
        self.fail_notification_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AutomationStore for MemoryAutomationStore {
    async fn find_enabled_automations(
        &self,
        company_id: Uuid,
        trigger: EventKind,
    ) -> StoreResult<Vec<AutomationRule>> {
        if self.fail_automation_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("automation lookup failure injected".to_string()));
        }

        let rules = lock(&self.rules)
            .iter()
            .filter(|rule| {
                rule.company_id == company_id
                    && rule.trigger_type == trigger
                    && rule.is_enabled
            })
            .cloned()
            .collect();

        Ok(rules)
    }

    async fn find_active_webhooks(
        &self,
        company_id: Uuid,
    ) -> StoreResult<Vec<WebhookSubscription>> {
        if self.fail_webhook_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("webhook lookup failure injected".to_string()));
        }

        let subscriptions = lock(&self.subscriptions)
            .iter()
            .filter(|sub| sub.company_id == company_id && sub.is_active)
            .cloned()
            .collect();

        Ok(subscriptions)
    }

    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Uuid> {
        if self.fail_notification_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("notification insert failure injected".to_string()));
        }

        let notification_id = Uuid::new_v4();
        lock(&self.notifications).push(Notification {
            id: notification_id,
            company_id: notification.company_id,
            user_id: notification.user_id,
            title: notification.title,
            message: notification.message,
            notification_type: notification.notification_type,
            read: false,
            created_at: Utc::now(),
        });

        Ok(notification_id)
    }
}

#[cfg(test)]
mod tests {
    use propel_shared::ActionKind;

    use super::*;

    fn rule(company_id: Uuid, trigger: EventKind, enabled: bool) -> AutomationRule {
        AutomationRule {
            id: Uuid::new_v4(),
            company_id,
            name: "Notify sales".to_string(),
            trigger_type: trigger,
            action_type: ActionKind::CreateNotification,
            config: serde_json::json!({}),
            is_enabled: enabled,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_lookup_filters_company_trigger_and_enabled() {
        let store = MemoryAutomationStore::new();
        let company_id = Uuid::new_v4();

        store.add_rule(rule(company_id, EventKind::LeadCreated, true));
        store.add_rule(rule(company_id, EventKind::LeadCreated, false));
        store.add_rule(rule(company_id, EventKind::TicketCreated, true));
        store.add_rule(rule(Uuid::new_v4(), EventKind::LeadCreated, true));

        let rules = store
            .find_enabled_automations(company_id, EventKind::LeadCreated)
            .await
            .unwrap();

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].company_id, company_id);
    }

    #[tokio::test]
    async fn test_disable_visible_on_next_lookup() {
        let store = MemoryAutomationStore::new();
        let company_id = Uuid::new_v4();
        let rule = rule(company_id, EventKind::LeadCreated, true);
        let rule_id = rule.id;
        store.add_rule(rule);

        let before = store
            .find_enabled_automations(company_id, EventKind::LeadCreated)
            .await
            .unwrap();
        assert_eq!(before.len(), 1);

        store.set_rule_enabled(rule_id, false);

        let after = store
            .find_enabled_automations(company_id, EventKind::LeadCreated)
            .await
            .unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryAutomationStore::new();
        store.fail_webhook_lookups(true);

        let result = store.find_active_webhooks(Uuid::new_v4()).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
