// Common test utilities that are shared across integration tests
use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;

use chrono::Utc;
use propel_automation::{
    AutomationEngine, DispatcherConfig, Mailer, MemoryAutomationStore, WebhookSubscription,
};
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

/// Dispatcher tuning that keeps failing tests fast: sub-second timeout and
/// no retries unless a test opts in.
pub fn test_dispatcher_config() -> DispatcherConfig {
    DispatcherConfig {
        timeout: Duration::from_millis(800),
        connect_timeout: Duration::from_millis(800),
        max_retries: 0,
        retry_backoff: Duration::from_millis(10),
        ..DispatcherConfig::default()
    }
}

pub fn engine_with(
    store: Arc<MemoryAutomationStore>,
    config: DispatcherConfig,
) -> AutomationEngine {
    AutomationEngine::new(store, Mailer::disabled(), config).unwrap()
}

pub fn subscription(company_id: Uuid, url: &str, events: &[&str]) -> WebhookSubscription {
    WebhookSubscription {
        id: Uuid::new_v4(),
        company_id,
        url: url.to_string(),
        events: events.iter().map(|e| e.to_string()).collect(),
        secret: "whsec_integration".to_string(),
        is_active: true,
        created_at: Utc::now(),
    }
}
