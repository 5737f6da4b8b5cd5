use crate::{
    entities::{
        order::{self, OrderStatus, ShippingStatus},
        order_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Order lifecycle management: listing, cancellation with restock, and
/// the admin status machines.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Who is asking. Customers only see and cancel their own orders.
#[derive(Debug, Clone, Copy)]
pub enum OrderActor {
    Customer(Uuid),
    Admin,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        actor: OrderActor,
        status: Option<OrderStatus>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let mut cond = Condition::all();
        if let OrderActor::Customer(customer_id) = actor {
            cond = cond.add(order::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = status {
            cond = cond.add(order::Column::Status.eq(status));
        }

        let query = order::Entity::find().filter(cond);
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_desc(order::Column::CreatedAt)
            .offset((page - 1) * limit)
            .limit(limit)
            .all(&*self.db)
            .await?;
        Ok((items, total))
    }

    pub async fn get_order(
        &self,
        order_id: Uuid,
        actor: OrderActor,
    ) -> Result<OrderView, ServiceError> {
        let order = self.load_order_for(order_id, actor).await?;
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;
        Ok(OrderView { order, items })
    }

    /// Cancels a pending order and returns its stock. Customers may only
    /// cancel their own orders; nothing but `pending` is cancellable.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        actor: OrderActor,
    ) -> Result<order::Model, ServiceError> {
        let order = self.load_order_for(order_id, actor).await?;

        if order.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot cancel an order in status '{}'",
                order.status.as_str()
            )));
        }

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        let txn = self.db.begin().await?;

        // Return exactly the quantities this order took.
        for item in &items {
            inventory::increment_stock(&txn, item.size_stock_id, item.quantity).await?;
        }

        let customer_id = order.customer_id;
        let order_number = order.order_number.clone();
        let now = Utc::now();
        let mut model: order::ActiveModel = order.into();
        model.status = Set(OrderStatus::Cancelled);
        model.cancelled_at = Set(Some(now));
        model.updated_at = Set(now);
        let updated = model.update(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, "Order cancelled, stock restored");
        self.event_sender
            .send_or_log(Event::OrderCancelled {
                order_id,
                user_id: customer_id,
                order_no: order_number,
            })
            .await;

        Ok(updated)
    }

    /// Admin: advances the order status along the linear chain.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        if new_status == OrderStatus::Cancelled {
            // Cancellation has its own path (restock + ownership rules).
            return Err(ServiceError::InvalidOperation(
                "Use the cancel endpoint to cancel an order".to_string(),
            ));
        }

        let order = self.load_order_for(order_id, OrderActor::Admin).await?;
        if !order.status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move order from '{}' to '{}'",
                order.status.as_str(),
                new_status.as_str()
            )));
        }

        let customer_id = order.customer_id;
        let order_number = order.order_number.clone();
        let old_status = order.status;
        let mut model: order::ActiveModel = order.into();
        model.status = Set(new_status);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                user_id: customer_id,
                order_no: order_number,
                old_status: old_status.as_str().to_string(),
                new_status: new_status.as_str().to_string(),
            })
            .await;

        Ok(updated)
    }

    /// Admin: advances the shipping status. `delivered` requires the
    /// order itself to have reached `shipping`.
    #[instrument(skip(self))]
    pub async fn update_shipping_status(
        &self,
        order_id: Uuid,
        new_status: ShippingStatus,
    ) -> Result<order::Model, ServiceError> {
        let order = self.load_order_for(order_id, OrderActor::Admin).await?;

        if !order.shipping_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move shipping from '{}' to '{}'",
                order.shipping_status.as_str(),
                new_status.as_str()
            )));
        }
        if new_status == ShippingStatus::Delivered
            && !matches!(
                order.status,
                OrderStatus::Shipping | OrderStatus::Completed
            )
        {
            return Err(ServiceError::InvalidStatus(
                "Order must be shipping before it can be delivered".to_string(),
            ));
        }

        let customer_id = order.customer_id;
        let order_number = order.order_number.clone();
        let mut model: order::ActiveModel = order.into();
        model.shipping_status = Set(new_status);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&*self.db).await?;

        // The transition guard only admits forward moves, so the new
        // status is in_transit or delivered here.
        let event = if new_status == ShippingStatus::Delivered {
            Event::OrderDelivered {
                order_id,
                user_id: customer_id,
                order_no: order_number,
            }
        } else {
            Event::OrderShipped {
                order_id,
                user_id: customer_id,
                order_no: order_number,
            }
        };
        self.event_sender.send_or_log(event).await;

        Ok(updated)
    }

    async fn load_order_for(
        &self,
        order_id: Uuid,
        actor: OrderActor,
    ) -> Result<order::Model, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if let OrderActor::Customer(customer_id) = actor {
            if order.customer_id != customer_id {
                // Do not leak existence of other customers' orders.
                return Err(ServiceError::NotFound(format!(
                    "Order {} not found",
                    order_id
                )));
            }
        }

        Ok(order)
    }
}
