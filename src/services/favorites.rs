use crate::{
    entities::{favorite, product},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-user product wishlists.
#[derive(Clone)]
pub struct FavoriteService {
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FavoriteView {
    pub id: Uuid,
    pub product: product::Model,
    pub created_at: chrono::DateTime<Utc>,
}

impl FavoriteService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Idempotent: favoriting twice returns the existing row.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<favorite::Model, ServiceError> {
        let product = product::Entity::find_by_id(product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let existing = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::ProductId.eq(product.id))
            .one(&*self.db)
            .await?;
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let model = favorite::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product.id),
            created_at: Set(Utc::now()),
        };
        Ok(model.insert(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        let existing = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Favorite not found".to_string()))?;

        existing.delete(&*self.db).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<FavoriteView>, u64), ServiceError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let total = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .count(&*self.db)
            .await?;

        let rows = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .find_also_related(product::Entity)
            .order_by_desc(favorite::Column::CreatedAt)
            .offset((page - 1) * limit)
            .limit(limit)
            .all(&*self.db)
            .await?;

        let items = rows
            .into_iter()
            .filter_map(|(fav, product)| {
                product.map(|product| FavoriteView {
                    id: fav.id,
                    product,
                    created_at: fav.created_at,
                })
            })
            .collect();
        Ok((items, total))
    }
}
