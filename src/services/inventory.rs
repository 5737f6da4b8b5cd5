//! Stock mutation primitives.
//!
//! Every stock change in the system goes through the conditional updates
//! in this module. There is deliberately no read-check-write path: the
//! guard lives in the UPDATE's WHERE clause, so concurrent checkouts can
//! never drive `stock` below zero.

use crate::{
    entities::size_stock,
    errors::ServiceError,
    events::EventSender,
};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Atomically subtracts `quantity` from a size stock, failing without any
/// mutation if it would go negative.
///
/// Returns `InsufficientStock` when the row is missing, inactive, or the
/// remaining stock is below `quantity`.
pub async fn decrement_stock<C: ConnectionTrait>(
    conn: &C,
    size_stock_id: Uuid,
    quantity: i32,
) -> Result<(), ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(
            "Quantity must be positive".to_string(),
        ));
    }

    let res = size_stock::Entity::update_many()
        .col_expr(
            size_stock::Column::Stock,
            Expr::col(size_stock::Column::Stock).sub(quantity),
        )
        .col_expr(
            size_stock::Column::Version,
            Expr::col(size_stock::Column::Version).add(1),
        )
        .filter(size_stock::Column::Id.eq(size_stock_id))
        .filter(size_stock::Column::IsActive.eq(true))
        .filter(size_stock::Column::Stock.gte(quantity))
        .exec(conn)
        .await?;

    if res.rows_affected == 0 {
        warn!(size_stock_id = %size_stock_id, quantity, "Stock decrement refused");
        return Err(ServiceError::InsufficientStock(format!(
            "Insufficient stock for item {}",
            size_stock_id
        )));
    }

    Ok(())
}

/// Atomically adds `quantity` back to a size stock (order cancellation,
/// restock).
pub async fn increment_stock<C: ConnectionTrait>(
    conn: &C,
    size_stock_id: Uuid,
    quantity: i32,
) -> Result<(), ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(
            "Quantity must be positive".to_string(),
        ));
    }

    let res = size_stock::Entity::update_many()
        .col_expr(
            size_stock::Column::Stock,
            Expr::col(size_stock::Column::Stock).add(quantity),
        )
        .col_expr(
            size_stock::Column::Version,
            Expr::col(size_stock::Column::Version).add(1),
        )
        .filter(size_stock::Column::Id.eq(size_stock_id))
        .exec(conn)
        .await?;

    if res.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "Size stock {} not found",
            size_stock_id
        )));
    }

    Ok(())
}

/// Admin-facing stock adjustment service.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    #[allow(dead_code)]
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Applies a signed stock delta. Negative deltas use the same guarded
    /// decrement as checkout and fail rather than underflow.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        size_stock_id: Uuid,
        delta: i32,
    ) -> Result<size_stock::Model, ServiceError> {
        if delta == 0 {
            return Err(ServiceError::ValidationError(
                "Adjustment delta must be non-zero".to_string(),
            ));
        }

        if delta > 0 {
            increment_stock(&*self.db, size_stock_id, delta).await?;
        } else {
            decrement_stock(&*self.db, size_stock_id, -delta).await?;
        }

        size_stock::Entity::find_by_id(size_stock_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Size stock {} not found", size_stock_id))
            })
    }
}
