use crate::{
    config::AppConfig,
    entities::{
        cart::{self, CartStatus},
        cart_item, size_stock,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Cart service. Each customer has at most one active cart; it is created
/// lazily on first access.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddItemInput {
    pub size_stock_id: Uuid,
    #[validate(range(min = 1, max = 999))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartView {
    #[serde(flatten)]
    pub cart: cart::Model,
    pub items: Vec<cart_item::Model>,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Returns the customer's active cart, creating it if none exists.
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, customer_id: Uuid) -> Result<cart::Model, ServiceError> {
        if let Some(existing) = cart::Entity::find()
            .filter(cart::Column::CustomerId.eq(customer_id))
            .filter(cart::Column::Status.eq(CartStatus::Active))
            .one(&*self.db)
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let model = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            currency: Set(self.config.default_currency.clone()),
            subtotal: Set(Decimal::ZERO),
            status: Set(CartStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;
        info!(cart_id = %created.id, "Cart created");
        self.event_sender
            .send_or_log(Event::CartCreated(created.id))
            .await;
        Ok(created)
    }

    /// Cart plus its items, for rendering.
    pub async fn get_cart_view(&self, customer_id: Uuid) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create_cart(customer_id).await?;
        let items = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(CartView { cart, items })
    }

    /// Adds a line, or bumps the quantity when the SKU is already in the
    /// cart. The stock check here is advisory; the authoritative check is
    /// the conditional decrement at checkout.
    #[instrument(skip(self, input))]
    pub async fn add_item(
        &self,
        customer_id: Uuid,
        input: AddItemInput,
    ) -> Result<CartView, ServiceError> {
        input.validate()?;
        let cart = self.get_or_create_cart(customer_id).await?;

        let stock_unit = size_stock::Entity::find_by_id(input.size_stock_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Size stock {} not found", input.size_stock_id))
            })?;
        if !stock_unit.is_active {
            return Err(ServiceError::InvalidOperation(
                "This item is no longer available".to_string(),
            ));
        }

        let unit_price = self.resolve_unit_price(&stock_unit).await?;

        let existing = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::SizeStockId.eq(input.size_stock_id))
            .one(&*self.db)
            .await?;

        let requested = existing.as_ref().map(|i| i.quantity).unwrap_or(0) + input.quantity;
        if requested > stock_unit.stock {
            return Err(ServiceError::InsufficientStock(format!(
                "Only {} left in stock",
                stock_unit.stock
            )));
        }

        let txn = self.db.begin().await?;
        let now = Utc::now();

        match existing {
            Some(item) => {
                let line_total = unit_price * Decimal::from(requested);
                let mut model: cart_item::ActiveModel = item.into();
                model.quantity = Set(requested);
                model.unit_price = Set(unit_price);
                model.line_total = Set(line_total);
                model.updated_at = Set(now);
                model.update(&txn).await?;
            }
            None => {
                let line_total = unit_price * Decimal::from(input.quantity);
                let model = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart.id),
                    size_stock_id: Set(input.size_stock_id),
                    sku: Set(stock_unit.sku.clone()),
                    quantity: Set(input.quantity),
                    unit_price: Set(unit_price),
                    line_total: Set(line_total),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&txn).await?;
            }
        }

        Self::recalculate_subtotal(&txn, cart.id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: cart.id,
                sku_id: input.size_stock_id,
            })
            .await;

        self.get_cart_view(customer_id).await
    }

    /// Sets a line's quantity. Zero removes the line.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        customer_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::ValidationError(
                "Quantity cannot be negative".to_string(),
            ));
        }

        let cart = self.get_or_create_cart(customer_id).await?;
        let item = cart_item::Entity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .filter(|i| i.cart_id == cart.id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        let txn = self.db.begin().await?;

        if quantity == 0 {
            item.delete(&txn).await?;
        } else {
            let stock_unit = size_stock::Entity::find_by_id(item.size_stock_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Size stock {} not found", item.size_stock_id))
                })?;
            if quantity > stock_unit.stock {
                return Err(ServiceError::InsufficientStock(format!(
                    "Only {} left in stock",
                    stock_unit.stock
                )));
            }

            let unit_price = item.unit_price;
            let mut model: cart_item::ActiveModel = item.into();
            model.quantity = Set(quantity);
            model.line_total = Set(unit_price * Decimal::from(quantity));
            model.updated_at = Set(Utc::now());
            model.update(&txn).await?;
        }

        Self::recalculate_subtotal(&txn, cart.id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                cart_id: cart.id,
                item_id,
            })
            .await;

        self.get_cart_view(customer_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        customer_id: Uuid,
        item_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create_cart(customer_id).await?;
        let item = cart_item::Entity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .filter(|i| i.cart_id == cart.id)
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        let txn = self.db.begin().await?;
        item.delete(&txn).await?;
        Self::recalculate_subtotal(&txn, cart.id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                cart_id: cart.id,
                item_id,
            })
            .await;

        self.get_cart_view(customer_id).await
    }

    #[instrument(skip(self))]
    pub async fn clear_cart(&self, customer_id: Uuid) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create_cart(customer_id).await?;

        let txn = self.db.begin().await?;
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;
        Self::recalculate_subtotal(&txn, cart.id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartCleared(cart.id))
            .await;

        self.get_cart_view(customer_id).await
    }

    /// Recomputes the cart subtotal from its lines inside the caller's
    /// transaction.
    pub(crate) async fn recalculate_subtotal<C: ConnectionTrait>(
        conn: &C,
        cart_id: Uuid,
    ) -> Result<(), ServiceError> {
        let items = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .all(conn)
            .await?;
        let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();

        let cart = cart::Entity::find_by_id(cart_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;
        let mut model: cart::ActiveModel = cart.into();
        model.subtotal = Set(subtotal);
        model.updated_at = Set(Utc::now());
        model.update(conn).await?;
        Ok(())
    }

    async fn resolve_unit_price(
        &self,
        stock_unit: &size_stock::Model,
    ) -> Result<Decimal, ServiceError> {
        use crate::entities::{product, product_color};

        let color = product_color::Entity::find_by_id(stock_unit.color_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Color {} not found", stock_unit.color_id))
            })?;
        let product = product::Entity::find_by_id(color.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", color.product_id))
            })?;
        if !product.is_active {
            return Err(ServiceError::InvalidOperation(
                "This product is no longer available".to_string(),
            ));
        }
        Ok(product.base_price)
    }
}
