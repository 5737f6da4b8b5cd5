use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events emitted by services after their database work commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // User events
    UserRegistered(Uuid),
    PasswordChanged(Uuid),

    // Cart events
    CartCreated(Uuid),
    CartItemAdded { cart_id: Uuid, sku_id: Uuid },
    CartItemUpdated { cart_id: Uuid, item_id: Uuid },
    CartItemRemoved { cart_id: Uuid, item_id: Uuid },
    CartCleared(Uuid),

    // Order events
    OrderCreated { order_id: Uuid, user_id: Uuid, order_no: String },
    OrderStatusChanged {
        order_id: Uuid,
        user_id: Uuid,
        order_no: String,
        old_status: String,
        new_status: String,
    },
    OrderCancelled { order_id: Uuid, user_id: Uuid, order_no: String },
    OrderShipped { order_id: Uuid, user_id: Uuid, order_no: String },
    OrderDelivered { order_id: Uuid, user_id: Uuid, order_no: String },

    // Coupon events
    CouponClaimed { coupon_id: Uuid, user_id: Uuid },
    CouponRedeemed { coupon_id: Uuid, user_id: Uuid, order_id: Uuid },

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Review events
    ReviewSubmitted { product_id: Uuid, user_id: Uuid },

}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
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

    /// Sends an event, logging a warning instead of failing if the channel
    /// is closed. Events are advisory; the database work already committed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("Dropping event {:?}: {}", event, e);
        }
    }
}

/// Creates the event channel and its sender handle.
pub fn create_event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Processes incoming events until the channel closes.
///
/// Order lifecycle events fan out into `user_notifications` rows so
/// customers see them in their in-app inbox.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, db: Arc<DatabaseConnection>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated {
                order_id,
                user_id,
                order_no,
            } => {
                notify_user(
                    &db,
                    *user_id,
                    "order",
                    &format!("Order {} placed", order_no),
                    &format!("Your order {} has been placed and is awaiting confirmation.", order_no),
                    Some(*order_id),
                )
                .await;
            }
            Event::OrderStatusChanged {
                order_id,
                user_id,
                order_no,
                new_status,
                ..
            } => {
                notify_user(
                    &db,
                    *user_id,
                    "order",
                    &format!("Order {} {}", order_no, new_status),
                    &format!("Your order {} is now {}.", order_no, new_status),
                    Some(*order_id),
                )
                .await;
            }
            Event::OrderCancelled {
                order_id,
                user_id,
                order_no,
            } => {
                notify_user(
                    &db,
                    *user_id,
                    "order",
                    &format!("Order {} cancelled", order_no),
                    &format!("Your order {} was cancelled and stock has been released.", order_no),
                    Some(*order_id),
                )
                .await;
            }
            Event::OrderShipped {
                order_id,
                user_id,
                order_no,
            } => {
                notify_user(
                    &db,
                    *user_id,
                    "shipping",
                    &format!("Order {} shipped", order_no),
                    &format!("Your order {} is on its way.", order_no),
                    Some(*order_id),
                )
                .await;
            }
            Event::OrderDelivered {
                order_id,
                user_id,
                order_no,
            } => {
                notify_user(
                    &db,
                    *user_id,
                    "shipping",
                    &format!("Order {} delivered", order_no),
                    &format!("Your order {} has been delivered.", order_no),
                    Some(*order_id),
                )
                .await;
            }
            Event::CouponClaimed { coupon_id, user_id } => {
                info!(coupon_id = %coupon_id, user_id = %user_id, "Coupon claimed");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event channel closed, stopping event processing loop");
}

async fn notify_user(
    db: &DatabaseConnection,
    user_id: Uuid,
    kind: &str,
    title: &str,
    body: &str,
    order_id: Option<Uuid>,
) {
    use crate::entities::user_notification;

    let notification = user_notification::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        notification_id: Set(None),
        order_id: Set(order_id),
        kind: Set(kind.to_string()),
        title: Set(title.to_string()),
        body: Set(body.to_string()),
        is_read: Set(false),
        read_at: Set(None),
        created_at: Set(Utc::now()),
    };

    if let Err(e) = notification.insert(db).await {
        error!(user_id = %user_id, "Failed to write user notification: {}", e);
    }
}
