use crate::{
    entities::{
        address,
        cart::{self, CartStatus},
        cart_item, order, order_item, product, product_color, size_stock,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{coupons::compute_discount, inventory, CouponService},
};
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Converts a customer's active cart into an order.
///
/// All stock decrements, the optional coupon consumption, and the order
/// insert happen in one database transaction: if any line cannot be
/// satisfied the whole attempt rolls back and nothing is mutated.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    coupons: CouponService,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderInput {
    pub address_id: Uuid,
    #[validate(length(min = 1, max = 50))]
    pub payment_method: String,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

pub fn generate_order_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("ORD-{}-{:06}", date, suffix)
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        coupons: CouponService,
    ) -> Self {
        Self {
            db,
            event_sender,
            coupons,
        }
    }

    #[instrument(skip(self, input), fields(customer_id = %customer_id))]
    pub async fn place_order(
        &self,
        customer_id: Uuid,
        input: PlaceOrderInput,
    ) -> Result<order::Model, ServiceError> {
        input.validate()?;

        // Active cart with at least one line.
        let cart = cart::Entity::find()
            .filter(cart::Column::CustomerId.eq(customer_id))
            .filter(cart::Column::Status.eq(CartStatus::Active))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InvalidOperation("Cart is empty".to_string()))?;

        let items = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .all(&*self.db)
            .await?;
        if items.is_empty() {
            return Err(ServiceError::InvalidOperation("Cart is empty".to_string()));
        }

        // The shipping address must belong to the customer.
        let shipping_address = address::Entity::find_by_id(input.address_id)
            .one(&*self.db)
            .await?
            .filter(|a| a.user_id == customer_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Address {} not found", input.address_id))
            })?;

        let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();

        // Validate the coupon before opening the transaction; consumption
        // still happens inside it.
        let coupon_ctx = match &input.coupon_code {
            Some(code) => {
                let (coupon, grant) = self
                    .coupons
                    .validate_for_user(code, customer_id, subtotal)
                    .await?;
                let discount = compute_discount(&coupon, subtotal);
                Some((coupon, grant, discount))
            }
            None => None,
        };
        let discount_total = coupon_ctx
            .as_ref()
            .map(|(_, _, d)| *d)
            .unwrap_or(Decimal::ZERO);

        let order_id = Uuid::new_v4();
        let order_number = generate_order_number();
        let now = Utc::now();

        let txn = self.db.begin().await?;

        // Per-line conditional decrement. Any refusal aborts the whole
        // checkout with nothing applied.
        for item in &items {
            if let Err(e) = inventory::decrement_stock(&txn, item.size_stock_id, item.quantity).await
            {
                error!(
                    order_number = %order_number,
                    sku = %item.sku,
                    "Checkout aborted: {}",
                    e
                );
                txn.rollback().await?;
                return Err(e);
            }
        }

        if let Some((coupon, grant, discount)) = &coupon_ctx {
            if let Err(e) = self
                .coupons
                .consume_in_txn(&txn, grant.id, order_id, *discount)
                .await
            {
                txn.rollback().await?;
                return Err(e);
            }
            info!(order_number = %order_number, code = %coupon.code, "Coupon applied");
        }

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            customer_id: Set(customer_id),
            address_id: Set(shipping_address.id),
            status: Set(order::OrderStatus::Pending),
            shipping_status: Set(order::ShippingStatus::NotShipped),
            payment_method: Set(input.payment_method.clone()),
            subtotal: Set(subtotal),
            discount_total: Set(discount_total),
            total: Set(subtotal - discount_total),
            coupon_code: Set(coupon_ctx.as_ref().map(|(c, _, _)| c.code.clone())),
            notes: Set(input.notes.clone()),
            cancelled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = order_model.insert(&txn).await?;

        for item in &items {
            let (product_name, color_name, size) =
                self.snapshot_names(&txn, item.size_stock_id).await?;
            let line = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                size_stock_id: Set(item.size_stock_id),
                sku: Set(item.sku.clone()),
                product_name: Set(product_name),
                color_name: Set(color_name),
                size: Set(size),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                line_total: Set(item.line_total),
                created_at: Set(now),
            };
            line.insert(&txn).await?;
        }

        // Retire the cart so the next add starts a fresh one.
        let mut cart_model: cart::ActiveModel = cart.into();
        cart_model.status = Set(CartStatus::Converted);
        cart_model.updated_at = Set(now);
        cart_model.update(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, order_number = %order_number, "Order placed");
        self.event_sender
            .send_or_log(Event::OrderCreated {
                order_id,
                user_id: customer_id,
                order_no: order_number,
            })
            .await;
        if let Some((coupon, _, _)) = &coupon_ctx {
            self.event_sender
                .send_or_log(Event::CouponRedeemed {
                    coupon_id: coupon.id,
                    user_id: customer_id,
                    order_id,
                })
                .await;
        }

        Ok(created)
    }

    async fn snapshot_names<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        size_stock_id: Uuid,
    ) -> Result<(String, String, String), ServiceError> {
        let stock_unit = size_stock::Entity::find_by_id(size_stock_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Size stock {} not found", size_stock_id))
            })?;
        let color = product_color::Entity::find_by_id(stock_unit.color_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Color {} not found", stock_unit.color_id))
            })?;
        let product = product::Entity::find_by_id(color.product_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", color.product_id))
            })?;
        Ok((product.name, color.name, stock_unit.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_carry_date_and_suffix() {
        let n = generate_order_number();
        assert!(n.starts_with("ORD-"));
        let parts: Vec<&str> = n.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
    }
}
