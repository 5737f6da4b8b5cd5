use crate::{
    entities::{
        order::{self, OrderStatus},
        order_item, product_color, review, size_stock,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Product reviews tied to completed orders, with admin moderation.
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitReviewInput {
    pub product_id: Uuid,
    pub order_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 4000))]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewSummary {
    pub reviews: Vec<review::Model>,
    pub total: u64,
    pub average_rating: Option<Decimal>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// One review per product per order, and only after the order
    /// completed.
    #[instrument(skip(self, input), fields(product_id = %input.product_id, order_id = %input.order_id))]
    pub async fn submit(
        &self,
        user_id: Uuid,
        input: SubmitReviewInput,
    ) -> Result<review::Model, ServiceError> {
        input.validate()?;

        let order = order::Entity::find_by_id(input.order_id)
            .filter(order::Column::CustomerId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", input.order_id)))?;

        if order.status != OrderStatus::Completed {
            return Err(ServiceError::InvalidOperation(
                "Reviews can only be submitted for completed orders".to_string(),
            ));
        }

        if !self.order_contains_product(order.id, input.product_id).await? {
            return Err(ServiceError::InvalidOperation(
                "This order does not contain that product".to_string(),
            ));
        }

        let existing = review::Entity::find()
            .filter(review::Column::ProductId.eq(input.product_id))
            .filter(review::Column::OrderId.eq(order.id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "This product has already been reviewed for this order".to_string(),
            ));
        }

        let now = Utc::now();
        let created = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            user_id: Set(user_id),
            order_id: Set(order.id),
            rating: Set(input.rating),
            title: Set(input.title),
            body: Set(input.body),
            is_approved: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ReviewSubmitted {
                product_id: created.product_id,
                user_id: created.user_id,
            })
            .await;
        Ok(created)
    }

    /// Approved reviews for a product, newest first, with the running
    /// average over the approved set.
    #[instrument(skip(self))]
    pub async fn list_for_product(
        &self,
        product_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<ReviewSummary, ServiceError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let base = review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::IsApproved.eq(true));

        let total = base.clone().count(&*self.db).await?;
        let reviews = base
            .clone()
            .order_by_desc(review::Column::CreatedAt)
            .offset((page - 1) * limit)
            .limit(limit)
            .all(&*self.db)
            .await?;

        let average_rating = if total == 0 {
            None
        } else {
            let ratings: Vec<i32> = base
                .select_only()
                .column(review::Column::Rating)
                .into_tuple()
                .all(&*self.db)
                .await?;
            let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
            Some(Decimal::from(sum) / Decimal::from(ratings.len() as i64))
        };

        Ok(ReviewSummary {
            reviews,
            total,
            average_rating,
        })
    }

    pub async fn list_mine(
        &self,
        user_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<review::Model>, u64), ServiceError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let total = review::Entity::find()
            .filter(review::Column::UserId.eq(user_id))
            .count(&*self.db)
            .await?;
        let items = review::Entity::find()
            .filter(review::Column::UserId.eq(user_id))
            .order_by_desc(review::Column::CreatedAt)
            .offset((page - 1) * limit)
            .limit(limit)
            .all(&*self.db)
            .await?;
        Ok((items, total))
    }

    // ---- admin moderation ----

    #[instrument(skip(self))]
    pub async fn list_pending(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<review::Model>, u64), ServiceError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let total = review::Entity::find()
            .filter(review::Column::IsApproved.eq(false))
            .count(&*self.db)
            .await?;
        let items = review::Entity::find()
            .filter(review::Column::IsApproved.eq(false))
            .order_by_asc(review::Column::CreatedAt)
            .offset((page - 1) * limit)
            .limit(limit)
            .all(&*self.db)
            .await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn approve(&self, review_id: Uuid) -> Result<review::Model, ServiceError> {
        let existing = review::Entity::find_by_id(review_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Review {} not found", review_id)))?;

        let mut model: review::ActiveModel = existing.into();
        model.is_approved = Set(true);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, review_id: Uuid) -> Result<(), ServiceError> {
        let existing = review::Entity::find_by_id(review_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Review {} not found", review_id)))?;
        existing.delete(&*self.db).await?;
        Ok(())
    }

    /// Order lines reference stock units, so walking back to the product
    /// goes through the unit's color.
    async fn order_contains_product(
        &self,
        order_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let unit_ids: Vec<Uuid> = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .select_only()
            .column(order_item::Column::SizeStockId)
            .into_tuple()
            .all(&*self.db)
            .await?;
        if unit_ids.is_empty() {
            return Ok(false);
        }

        let color_ids: Vec<Uuid> = size_stock::Entity::find()
            .filter(size_stock::Column::Id.is_in(unit_ids))
            .select_only()
            .column(size_stock::Column::ColorId)
            .into_tuple()
            .all(&*self.db)
            .await?;
        if color_ids.is_empty() {
            return Ok(false);
        }

        let matched = product_color::Entity::find()
            .filter(product_color::Column::Id.is_in(color_ids))
            .filter(product_color::Column::ProductId.eq(product_id))
            .count(&*self.db)
            .await?;
        Ok(matched > 0)
    }
}
