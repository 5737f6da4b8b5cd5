use crate::{
    entities::{notification, user, user_notification},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Announcements and per-user notification feeds.
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BroadcastInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

impl NotificationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Admin broadcast: one announcement row fanned out to every active
    /// user's feed in a single transaction.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn broadcast(
        &self,
        input: BroadcastInput,
    ) -> Result<notification::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let announcement = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title.clone()),
            body: Set(input.body.clone()),
            kind: Set("announcement".to_string()),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let recipients: Vec<Uuid> = user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .select_only()
            .column(user::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        let fanout = recipients.len();
        if fanout > 0 {
            let rows = recipients.into_iter().map(|user_id| user_notification::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                notification_id: Set(Some(announcement.id)),
                order_id: Set(None),
                kind: Set("announcement".to_string()),
                title: Set(input.title.clone()),
                body: Set(input.body.clone()),
                is_read: Set(false),
                read_at: Set(None),
                created_at: Set(now),
            });
            user_notification::Entity::insert_many(rows).exec(&txn).await?;
        }

        txn.commit().await?;
        info!(notification_id = %announcement.id, fanout, "Broadcast sent");
        Ok(announcement)
    }

    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<user_notification::Model>, u64), ServiceError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let total = user_notification::Entity::find()
            .filter(user_notification::Column::UserId.eq(user_id))
            .count(&*self.db)
            .await?;
        let items = user_notification::Entity::find()
            .filter(user_notification::Column::UserId.eq(user_id))
            .order_by_desc(user_notification::Column::CreatedAt)
            .offset((page - 1) * limit)
            .limit(limit)
            .all(&*self.db)
            .await?;
        Ok((items, total))
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        Ok(user_notification::Entity::find()
            .filter(user_notification::Column::UserId.eq(user_id))
            .filter(user_notification::Column::IsRead.eq(false))
            .count(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<user_notification::Model, ServiceError> {
        let row = user_notification::Entity::find_by_id(notification_id)
            .filter(user_notification::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Notification not found".to_string()))?;

        if row.is_read {
            return Ok(row);
        }
        let mut model: user_notification::ActiveModel = row.into();
        model.is_read = Set(true);
        model.read_at = Set(Some(Utc::now()));
        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let result = user_notification::Entity::update_many()
            .col_expr(user_notification::Column::IsRead, Expr::value(true))
            .col_expr(user_notification::Column::ReadAt, Expr::value(Utc::now()))
            .filter(user_notification::Column::UserId.eq(user_id))
            .filter(user_notification::Column::IsRead.eq(false))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
