// Postgres-backed automation store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use propel_shared::{ActionKind, AutomationRule, EventKind, NewNotification, WebhookSubscription};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AutomationStore, StoreResult};

#[derive(Clone)]
pub struct PgAutomationStore {
    db_pool: PgPool,
}

impl PgAutomationStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AutomationStore for PgAutomationStore {
    async fn find_enabled_automations(
        &self,
        company_id: Uuid,
        trigger: EventKind,
    ) -> StoreResult<Vec<AutomationRule>> {
        let rows = sqlx::query_as::<_, (
            Uuid, Uuid, String, String, String, serde_json::Value, bool,
            DateTime<Utc>, Option<DateTime<Utc>>,
        )>(
            r#"
            SELECT
                id, company_id, name, trigger_type, action_type,
                config, is_enabled, created_at, updated_at
            FROM automation_rules
            WHERE company_id = $1 AND trigger_type = $2 AND is_enabled = true
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .bind(trigger.as_str())
        .fetch_all(&self.db_pool)
        .await?;

        let rules = rows
            .into_iter()
            .filter_map(|row| {
                // trigger_type matched the bind, so this only drops rows if
                // the column was edited out from under us mid-query
                let trigger_type = EventKind::parse(&row.3)?;

                Some(AutomationRule {
                    id: row.0,
                    company_id: row.1,
                    name: row.2,
                    trigger_type,
                    action_type: ActionKind::parse(&row.4),
                    config: row.5,
                    is_enabled: row.6,
                    created_at: row.7,
                    updated_at: row.8,
                })
            })
            .collect();

        Ok(rules)
    }

    async fn find_active_webhooks(
        &self,
        company_id: Uuid,
    ) -> StoreResult<Vec<WebhookSubscription>> {
        let subscriptions = sqlx::query_as::<_, WebhookSubscription>(
            r#"
            SELECT id, company_id, url, events, secret, is_active, created_at
            FROM webhook_subscriptions
            WHERE company_id = $1 AND is_active = true
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(subscriptions)
    }

    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Uuid> {
        let notification_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO notifications
                (id, company_id, user_id, title, message, notification_type, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, false, NOW())
            "#,
        )
        .bind(notification_id)
        .bind(notification.company_id)
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.notification_type)
        .execute(&self.db_pool)
        .await?;

        Ok(notification_id)
    }
}
