// Action Executor - performs the side effect an automation rule asks for

use std::sync::Arc;

use propel_shared::{ActionKind, AutomationRule, NewNotification};
use tracing::{info, warn};
use uuid::Uuid;

use crate::email::{EmailDisposition, EmailError, Mailer};
use crate::events::Event;
use crate::store::{AutomationStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Missing `{0}` in rule config")]
    MissingConfig(&'static str),

    #[error("Invalid `{0}` in rule config")]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Email(#[from] EmailError),
}

#[derive(Clone)]
pub struct ActionExecutor {
    store: Arc<dyn AutomationStore>,
    mailer: Mailer,
}

impl ActionExecutor {
    pub fn new(store: Arc<dyn AutomationStore>, mailer: Mailer) -> Self {
        Self { store, mailer }
    }

    /// Run the action `rule` asks for. Matching and enabled/trigger
    /// filtering already happened at the store; this performs exactly one
    /// side effect per call. Errors describe a locally failed action and
    /// must be caught (and logged) by the caller, never propagated to the
    /// code that raised the event.
    pub async fn execute(&self, rule: &AutomationRule, event: &Event) -> Result<(), ActionError> {
        match &rule.action_type {
            ActionKind::CreateNotification => self.execute_create_notification(rule, event).await,
            ActionKind::SendEmail => self.execute_send_email(rule, event).await,
            ActionKind::Unknown(name) => {
                warn!("Rule {} has unknown action type '{}', skipping", rule.id, name);
                Ok(())
            }
        }
    }

    async fn execute_create_notification(
        &self,
        rule: &AutomationRule,
        event: &Event,
    ) -> Result<(), ActionError> {
        // Recipients are explicit configuration, never guessed
        let recipient = rule
            .config
            .get("recipient_id")
            .and_then(|v| v.as_str())
            .ok_or(ActionError::MissingConfig("recipient_id"))?;
        let recipient: Uuid = recipient
            .parse()
            .map_err(|_| ActionError::InvalidConfig("recipient_id"))?;

        let notification_id = self
            .store
            .insert_notification(NewNotification {
                company_id: event.company_id(),
                user_id: recipient,
                title: rule.name.clone(),
                message: event.payload().to_string(),
                notification_type: "automation".to_string(),
            })
            .await?;

        info!(
            "Created notification {} for user {} (rule '{}')",
            notification_id, recipient, rule.name
        );
        Ok(())
    }

    async fn execute_send_email(
        &self,
        rule: &AutomationRule,
        event: &Event,
    ) -> Result<(), ActionError> {
        let to = rule
            .config
            .get("to")
            .and_then(|v| v.as_str())
            .ok_or(ActionError::MissingConfig("to"))?;

        let payload = event.payload();
        let subject = match rule.config.get("subject").and_then(|v| v.as_str()) {
            Some(template) => render_template(template, &payload),
            None => rule.name.clone(),
        };
        let body = match rule.config.get("body").and_then(|v| v.as_str()) {
            Some(template) => render_template(template, &payload),
            None => payload.to_string(),
        };

        if self.mailer.send(to, &subject, &body).await? == EmailDisposition::Skipped {
            info!("Email for rule '{}' skipped, SMTP not configured", rule.name);
        }
        Ok(())
    }
}

/// Replace `{{field}}` placeholders with values from the event payload.
/// Dotted paths descend into nested objects; unresolved placeholders are
/// left verbatim.
fn render_template(template: &str, payload: &serde_json::Value) -> String {
    let mut result = template.to_string();

    let re = regex::Regex::new(r"\{\{([^}]+)\}\}").unwrap();

    for cap in re.captures_iter(template) {
        let value = get_nested_value(payload, &cap[1]);

        if let Some(val) = value {
            let replacement = match val {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => val.to_string(),
            };
            result = result.replace(&cap[0], &replacement);
        }
    }

    result
}

fn get_nested_value(json: &serde_json::Value, path: &str) -> Option<serde_json::Value> {
    let mut current = json;

    for part in path.split('.') {
        match current.get(part) {
            Some(v) => current = v,
            None => return None,
        }
    }

    Some(current.clone())
}
