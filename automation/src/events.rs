// Domain Events - Typed payloads that trigger automations and webhook dispatch

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use propel_shared::EventKind;

/// Payload for a lead entering the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadCreated {
    pub company_id: Uuid,
    pub lead_id: Uuid,
    pub name: String,
    pub source: String, // acquisition channel, e.g. "referral", "webform"
}

/// Payload for a lead moving between pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadStatusChanged {
    pub company_id: Uuid,
    pub lead_id: Uuid,
    pub old_status: String,
    pub new_status: String,
    /// User who moved the lead; `None` for system-initiated changes.
    pub user_id: Option<Uuid>,
}

/// Payload for a new support ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketCreated {
    pub company_id: Uuid,
    pub ticket_id: Uuid,
    pub title: String,
    pub priority: String,
    pub created_by: Uuid,
}

/// A domain event, one variant per [`EventKind`].
///
/// The payload shape is fixed by the variant, so producers cannot raise an
/// event with the wrong fields and consumers can match exhaustively. Adding
/// an event means adding a variant here plus its payload struct; the
/// compiler flags every place that needs to handle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    LeadCreated(LeadCreated),
    LeadStatusChanged(LeadStatusChanged),
    TicketCreated(TicketCreated),
}

impl Event {
    /// Create a lead created event
    pub fn lead_created(company_id: Uuid, lead_id: Uuid, name: &str, source: &str) -> Self {
        Event::LeadCreated(LeadCreated {
            company_id,
            lead_id,
            name: name.to_string(),
            source: source.to_string(),
        })
    }

    /// Create a lead status changed event
    pub fn lead_status_changed(
        company_id: Uuid,
        lead_id: Uuid,
        old_status: &str,
        new_status: &str,
        user_id: Option<Uuid>,
    ) -> Self {
        Event::LeadStatusChanged(LeadStatusChanged {
            company_id,
            lead_id,
            old_status: old_status.to_string(),
            new_status: new_status.to_string(),
            user_id,
        })
    }

    /// Create a ticket created event
    pub fn ticket_created(
        company_id: Uuid,
        ticket_id: Uuid,
        title: &str,
        priority: &str,
        created_by: Uuid,
    ) -> Self {
        Event::TicketCreated(TicketCreated {
            company_id,
            ticket_id,
            title: title.to_string(),
            priority: priority.to_string(),
            created_by,
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::LeadCreated(_) => EventKind::LeadCreated,
            Event::LeadStatusChanged(_) => EventKind::LeadStatusChanged,
            Event::TicketCreated(_) => EventKind::TicketCreated,
        }
    }

    /// Tenant the event belongs to. Every lookup downstream is scoped to it.
    pub fn company_id(&self) -> Uuid {
        match self {
            Event::LeadCreated(p) => p.company_id,
            Event::LeadStatusChanged(p) => p.company_id,
            Event::TicketCreated(p) => p.company_id,
        }
    }

    /// Event-specific fields as the JSON object embedded in webhook
    /// envelopes and notification bodies.
    pub fn payload(&self) -> serde_json::Value {
        let payload = match self {
            Event::LeadCreated(p) => serde_json::to_value(p),
            Event::LeadStatusChanged(p) => serde_json::to_value(p),
            Event::TicketCreated(p) => serde_json::to_value(p),
        };
        payload.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let company_id = Uuid::new_v4();
        let event = Event::ticket_created(
            company_id,
            Uuid::new_v4(),
            "Printer on fire",
            "high",
            Uuid::new_v4(),
        );

        assert_eq!(event.kind(), EventKind::TicketCreated);
        assert_eq!(event.company_id(), company_id);
        assert_eq!(event.payload().get("title").unwrap(), "Printer on fire");
    }

    #[test]
    fn test_lead_status_changed_payload() {
        let event = Event::lead_status_changed(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "new",
            "qualified",
            None,
        );

        let payload = event.payload();
        assert_eq!(payload.get("old_status").unwrap(), "new");
        assert_eq!(payload.get("new_status").unwrap(), "qualified");
        assert!(payload.get("user_id").unwrap().is_null());
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(EventKind::LeadCreated.as_str(), "lead_created");
        assert_eq!(EventKind::LeadStatusChanged.as_str(), "lead_status_changed");
        assert_eq!(EventKind::TicketCreated.as_str(), "ticket_created");

        for kind in EventKind::ALL {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::parse("invoice_paid"), None);
    }
}
