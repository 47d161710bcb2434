// Automation Engine - event intake and fan-out orchestration

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info};

use crate::config::DispatcherConfig;
use crate::dispatcher::WebhookDispatcher;
use crate::email::Mailer;
use crate::events::Event;
use crate::executor::ActionExecutor;
use crate::store::{matches_event, AutomationStore};

/// Counts of what one trigger attempted. Callers are free to ignore it;
/// beyond these totals no per-item outcome is surfaced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TriggerSummary {
    pub automations_attempted: usize,
    pub automations_failed: usize,
    pub webhooks_attempted: usize,
    pub webhooks_failed: usize,
}

#[derive(Clone)]
pub struct AutomationEngine {
    store: Arc<dyn AutomationStore>,
    executor: ActionExecutor,
    dispatcher: WebhookDispatcher,
}

impl AutomationEngine {
    pub fn new(
        store: Arc<dyn AutomationStore>,
        mailer: Mailer,
        dispatcher_config: DispatcherConfig,
    ) -> anyhow::Result<Self> {
        let executor = ActionExecutor::new(store.clone(), mailer);
        let dispatcher = WebhookDispatcher::new(dispatcher_config)?;

        Ok(Self {
            store,
            executor,
            dispatcher,
        })
    }

    /// React to a domain event: run every enabled matching automation rule,
    /// then deliver the event to every active matching webhook subscription.
    ///
    /// Rules run sequentially; webhook deliveries go out concurrently. Each
    /// rule and each delivery fails in isolation: the failure is logged and
    /// the rest proceed. A failed store lookup abandons that phase alone.
    /// This never panics and never returns an error, so raising an event
    /// cannot break the business action that caused it.
    ///
    /// Rules and subscriptions are read fresh on every call. There is no
    /// cross-trigger cache, so an edit (disable, re-point, new secret) takes
    /// effect on the very next event.
    pub async fn trigger(&self, event: Event) -> TriggerSummary {
        let kind = event.kind();
        let company_id = event.company_id();
        let mut summary = TriggerSummary::default();

        debug!("Processing {} event for company {}", kind, company_id);

        match self.store.find_enabled_automations(company_id, kind).await {
            Ok(rules) => {
                for rule in &rules {
                    summary.automations_attempted += 1;
                    if let Err(e) = self.executor.execute(rule, &event).await {
                        summary.automations_failed += 1;
                        error!(
                            "Automation rule {} ('{}') failed for {}: {}",
                            rule.id, rule.name, kind, e
                        );
                    }
                }
            }
            Err(e) => {
                error!("Automation lookup failed for {} event: {}", kind, e);
            }
        }

        match self.store.find_active_webhooks(company_id).await {
            Ok(subscriptions) => {
                let matching: Vec<_> = subscriptions
                    .into_iter()
                    .filter(|sub| matches_event(sub, kind))
                    .collect();

                summary.webhooks_attempted = matching.len();

                let dispatcher = &self.dispatcher;
                let event_ref = &event;
                let deliveries = matching.iter().map(|sub| async move {
                    match dispatcher.deliver(sub, event_ref).await {
                        Ok(receipt) => {
                            debug!(
                                "Delivered {} to {} (HTTP {}, {} attempt(s))",
                                kind, sub.url, receipt.status, receipt.attempts
                            );
                            true
                        }
                        Err(e) => {
                            error!("Webhook delivery to {} failed for {}: {}", sub.url, kind, e);
                            false
                        }
                    }
                });

                summary.webhooks_failed = join_all(deliveries)
                    .await
                    .into_iter()
                    .filter(|delivered| !delivered)
                    .count();
            }
            Err(e) => {
                error!("Webhook lookup failed for {} event: {}", kind, e);
            }
        }

        if summary.automations_attempted == 0 && summary.webhooks_attempted == 0 {
            debug!("Nothing subscribed to {} event for company {}", kind, company_id);
        } else {
            info!(
                "Processed {} event: {} automation(s) ({} failed), {} webhook(s) ({} failed)",
                kind,
                summary.automations_attempted,
                summary.automations_failed,
                summary.webhooks_attempted,
                summary.webhooks_failed
            );
        }

        summary
    }

    /// Fire-and-forget [`trigger`](Self::trigger): spawns onto the runtime
    /// so event producers do not inherit dispatch latency.
    pub fn trigger_detached(&self, event: Event) {
        let engine = self.clone();
        tokio::spawn(async move {
            engine.trigger(event).await;
        });
    }
}
