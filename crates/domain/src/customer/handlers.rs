//! Event handlers for committed customer events.

use async_trait::async_trait;
use repository::{DomainEvent, EventHandler};
use tracing::info;

use super::CustomerEvent;

/// Writes every committed customer event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomerEventLogger;

#[async_trait]
impl EventHandler<CustomerEvent> for CustomerEventLogger {
    fn name(&self) -> &'static str {
        "CustomerEventLogger"
    }

    async fn handle(&self, event: &CustomerEvent) -> Result<(), String> {
        info!(
            event_type = event.event_type(),
            customer_id = %event.customer_id(),
            occurred_at = %event.occurred_at(),
            "Customer event committed"
        );
        metrics::counter!("customer_events_total", "event_type" => event.event_type())
            .increment(1);
        Ok(())
    }
}
