// Automation Store - persistence boundary for rules, subscriptions, notifications

use async_trait::async_trait;
use propel_shared::{
    AutomationRule, EventKind, NewNotification, WebhookSubscription, EVENT_WILDCARD,
};
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryAutomationStore;
pub use postgres::PgAutomationStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read side of rule and subscription storage, plus the one write the
/// automation core performs (notification inserts).
///
/// Every method takes the tenant; implementations must never return another
/// company's rows. Reads are point-in-time: the engine re-queries on every
/// trigger, so enable/disable edits take effect on the next event without
/// any cache invalidation.
#[async_trait]
pub trait AutomationStore: Send + Sync {
    /// Enabled rules of the company whose trigger matches `trigger`.
    async fn find_enabled_automations(
        &self,
        company_id: Uuid,
        trigger: EventKind,
    ) -> StoreResult<Vec<AutomationRule>>;

    /// Active webhook subscriptions of the company, regardless of event.
    /// Event-name filtering happens in-process, see [`matches_event`].
    async fn find_active_webhooks(
        &self,
        company_id: Uuid,
    ) -> StoreResult<Vec<WebhookSubscription>>;

    /// Persist a notification, returning its id.
    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Uuid>;
}

/// Whether a subscription wants `kind`: either the wire name is listed or
/// the subscription carries the `"*"` wildcard.
pub fn matches_event(subscription: &WebhookSubscription, kind: EventKind) -> bool {
    subscription
        .events
        .iter()
        .any(|name| name == kind.as_str() || name == EVENT_WILDCARD)
}
