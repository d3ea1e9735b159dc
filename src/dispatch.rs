//! Notification dispatcher — fans an order out to every active shopkeeper.
//!
//! Per-recipient failure isolation: one bad recipient never aborts the
//! rest of the batch. A quota-exhausted send is logged with the message
//! content for out-of-band follow-up and still counts as processed.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::TransportError;
use crate::order::{Order, format};
use crate::store::Store;
use crate::transport::Transport;

/// Per-recipient delivery outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// Send hit the transport's message quota; content was logged.
    RateLimited,
    Failed,
}

/// One recipient's outcome.
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub recipient: String,
    pub status: DeliveryStatus,
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default)]
pub struct NotifyResult {
    pub deliveries: Vec<DeliveryRecord>,
}

impl NotifyResult {
    /// Recipients that were delivered or rate-limited-but-logged.
    pub fn processed(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| d.status != DeliveryStatus::Failed)
            .count()
    }

    pub fn delivered(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| d.status == DeliveryStatus::Delivered)
            .count()
    }

    /// Whether at least one recipient was processed.
    pub fn any_processed(&self) -> bool {
        self.processed() > 0
    }
}

/// Resolves recipients and delivers order notifications.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    store: Arc<dyn Store>,
    /// Configuration-driven recipients merged into every fan-out, after
    /// the shopkeeper pool. Supplied by the caller at construction.
    extra_recipients: Vec<String>,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn Store>,
        extra_recipients: Vec<String>,
    ) -> Self {
        Self {
            transport,
            store,
            extra_recipients,
        }
    }

    /// Current recipient set: active shopkeepers plus the configured
    /// extras, deduplicated, in resolution order.
    async fn resolve_recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = match self.store.active_shopkeepers().await {
            Ok(shopkeepers) => shopkeepers.into_iter().map(|p| p.identity).collect(),
            Err(e) => {
                error!(error = %e, "Failed to resolve shopkeeper pool");
                Vec::new()
            }
        };
        for extra in &self.extra_recipients {
            if !recipients.iter().any(|r| r == extra) {
                recipients.push(extra.clone());
            }
        }
        recipients
    }

    /// Notify every resolved recipient about `order`.
    ///
    /// If at least one recipient was processed, the order's notified list
    /// is updated to the full resolved set — attempted, not confirmed.
    pub async fn notify(&self, order: &Order) -> NotifyResult {
        let recipients = self.resolve_recipients().await;
        if recipients.is_empty() {
            warn!(order_id = %order.id, "No recipients to notify");
            return NotifyResult::default();
        }

        let body = format::shopkeeper_notification(order);
        let mut result = NotifyResult::default();

        for recipient in &recipients {
            let status = match self.transport.send_message(recipient, &body).await {
                Ok(()) => {
                    info!(order_id = %order.id, recipient = %recipient, "Notification sent");
                    DeliveryStatus::Delivered
                }
                Err(e) if e.is_rate_limit() => {
                    // Queue-for-operator semantics: the content is in the
                    // log, the recipient counts as processed.
                    warn!(
                        order_id = %order.id,
                        recipient = %recipient,
                        content = %body,
                        "Message quota reached; notification logged for follow-up"
                    );
                    DeliveryStatus::RateLimited
                }
                Err(TransportError::SendFailed { reason, .. }) => {
                    warn!(
                        order_id = %order.id,
                        recipient = %recipient,
                        reason = %reason,
                        "Failed to notify recipient"
                    );
                    DeliveryStatus::Failed
                }
                Err(e) => {
                    warn!(order_id = %order.id, recipient = %recipient, error = %e, "Failed to notify recipient");
                    DeliveryStatus::Failed
                }
            };
            result.deliveries.push(DeliveryRecord {
                recipient: recipient.clone(),
                status,
            });
        }

        if result.any_processed() {
            if let Err(e) = self.store.set_notified(order.id, &recipients).await {
                error!(order_id = %order.id, error = %e, "Failed to record notified recipients");
            }
            info!(
                order_id = %order.id,
                processed = result.processed(),
                total = recipients.len(),
                "Notifications processed"
            );
        }

        result
    }
}
