use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription event entry that matches every event name.
pub const EVENT_WILDCARD: &str = "*";

/// Domain events that can trigger automations and webhook deliveries.
///
/// The set is closed: adding an event means adding a variant here and a
/// payload struct in the automation crate. Wire names are snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LeadCreated,
    LeadStatusChanged,
    TicketCreated,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::LeadCreated,
        EventKind::LeadStatusChanged,
        EventKind::TicketCreated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::LeadCreated => "lead_created",
            EventKind::LeadStatusChanged => "lead_status_changed",
            EventKind::TicketCreated => "ticket_created",
        }
    }

    pub fn parse(raw: &str) -> Option<EventKind> {
        match raw {
            "lead_created" => Some(EventKind::LeadCreated),
            "lead_status_changed" => Some(EventKind::LeadStatusChanged),
            "ticket_created" => Some(EventKind::TicketCreated),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an automation rule does when its trigger fires.
///
/// Stored as plain text; names this build doesn't recognize survive as
/// `Unknown` so old rows and newer rule types never break dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateNotification,
    SendEmail,
    Unknown(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::CreateNotification => "create_notification",
            ActionKind::SendEmail => "send_email",
            ActionKind::Unknown(other) => other,
        }
    }

    pub fn parse(raw: &str) -> ActionKind {
        match raw {
            "create_notification" => ActionKind::CreateNotification,
            "send_email" => ActionKind::SendEmail,
            other => ActionKind::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActionKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ActionKind::parse(&raw))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub trigger_type: EventKind,
    pub action_type: ActionKind,
    pub config: serde_json::Value, // action-specific settings
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
    pub id: Uuid,
    pub company_id: Uuid,
    pub url: String,
    pub events: Vec<String>, // subscribed event names, may contain "*"
    pub secret: String,      // HMAC key for delivery signatures
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: String,
}
