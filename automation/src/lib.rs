// Propel Automation Core
//
// Event-driven automation and webhook dispatch for the Propel agency
// platform. Product code raises a typed Event; the engine looks up the
// tenant's enabled automation rules and active webhook subscriptions at that
// moment, runs each rule's action with per-rule failure isolation, and
// concurrently delivers a signed JSON envelope to every subscribed endpoint.
// Errors never propagate back to the code that raised the event.

pub mod config;
pub mod database;
pub mod dispatcher;
pub mod email;
pub mod engine;
pub mod events;
pub mod executor;
pub mod signing;
pub mod store;

pub use config::{Config, DispatcherConfig, PoolConfig, SmtpConfig};
pub use dispatcher::{DeliveryError, DeliveryReceipt, WebhookDispatcher, WebhookEnvelope};
pub use email::{EmailDisposition, EmailError, Mailer};
pub use engine::{AutomationEngine, TriggerSummary};
pub use events::{Event, EventKind, LeadCreated, LeadStatusChanged, TicketCreated};
pub use executor::{ActionError, ActionExecutor};
pub use store::{
    matches_event, AutomationStore, MemoryAutomationStore, PgAutomationStore, StoreError,
};

pub use propel_shared::{
    ActionKind, AutomationRule, NewNotification, Notification, WebhookSubscription,
    EVENT_WILDCARD,
};
