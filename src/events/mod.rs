use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::payment_history::ProjectKind;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing the caller when the channel is closed
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "domain event dropped");
        }
    }
}

/// Domain events emitted after a successful write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProjectCreated {
        project_id: Uuid,
        kind: ProjectKind,
        region: String,
    },
    ProjectStageChanged {
        project_id: Uuid,
        kind: ProjectKind,
        from: String,
        to: String,
    },
    ProjectDeleted {
        project_id: Uuid,
        kind: ProjectKind,
    },
    PaymentRecorded {
        payment_id: Uuid,
        project_id: Uuid,
        kind: ProjectKind,
        amount: Decimal,
        outstanding_after: Decimal,
    },
    PaymentDeleted {
        payment_id: Uuid,
        project_id: Uuid,
    },
    InvoiceIssued {
        invoice_id: Uuid,
        invoice_number: String,
        total_amount: Decimal,
    },
    TicketStatusChanged {
        ticket_id: Uuid,
        from: String,
        to: String,
    },
    DispatchStatusChanged {
        record_id: Uuid,
        from: String,
        to: String,
    },
    ProcurementStatusChanged {
        procurement_id: Uuid,
        from: String,
        to: String,
    },
    StockAdjusted {
        stock_item_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
        reason: String,
    },
    LowStock {
        stock_item_id: Uuid,
        sku: String,
        quantity: i32,
    },
    AssignmentCreated {
        assignment_id: Uuid,
        stock_item_id: Uuid,
        quantity: i32,
    },
    AssignmentDeleted {
        assignment_id: Uuid,
        stock_item_id: Uuid,
        quantity: i32,
    },
    UserChanged {
        user_id: Uuid,
        active: bool,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ProjectCreated { .. } => "project_created",
            Event::ProjectStageChanged { .. } => "project_stage_changed",
            Event::ProjectDeleted { .. } => "project_deleted",
            Event::PaymentRecorded { .. } => "payment_recorded",
            Event::PaymentDeleted { .. } => "payment_deleted",
            Event::InvoiceIssued { .. } => "invoice_issued",
            Event::TicketStatusChanged { .. } => "ticket_status_changed",
            Event::DispatchStatusChanged { .. } => "dispatch_status_changed",
            Event::ProcurementStatusChanged { .. } => "procurement_status_changed",
            Event::StockAdjusted { .. } => "stock_adjusted",
            Event::LowStock { .. } => "low_stock",
            Event::AssignmentCreated { .. } => "assignment_created",
            Event::AssignmentDeleted { .. } => "assignment_deleted",
            Event::UserChanged { .. } => "user_changed",
        }
    }
}

/// Drains the event channel, logging each event. Runs until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::LowStock {
                stock_item_id,
                sku,
                quantity,
            } => {
                warn!(%stock_item_id, %sku, quantity, "stock at or below reorder level");
            }
            Event::PaymentRecorded {
                project_id,
                amount,
                outstanding_after,
                ..
            } => {
                info!(%project_id, %amount, %outstanding_after, "payment recorded");
            }
            other => {
                info!(event = other.name(), payload = ?other, "domain event");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let event = || Event::UserChanged {
            user_id: Uuid::nil(),
            active: false,
        };
        sender.send(event()).await.unwrap();
        drop(rx);
        assert!(sender.send(event()).await.is_err());
        // never panics or errors for the caller
        sender.send_or_log(event()).await;
    }

    #[tokio::test]
    async fn processor_stops_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(process_events(rx));
        let sender = EventSender::new(tx);
        sender
            .send(Event::LowStock {
                stock_item_id: Uuid::new_v4(),
                sku: "PNL-540".into(),
                quantity: 2,
            })
            .await
            .unwrap();
        drop(sender);
        handle.await.unwrap();
    }
}
