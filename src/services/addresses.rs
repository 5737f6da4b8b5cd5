use crate::{entities::address, errors::ServiceError};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Shipping addresses, scoped to their owner.
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAddressInput {
    #[validate(length(min = 1, max = 100))]
    pub recipient: String,
    #[validate(length(min = 5, max = 32))]
    pub phone: String,
    #[validate(length(min = 1, max = 200))]
    pub line1: String,
    #[validate(length(max = 200))]
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub region: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 2, max = 2))]
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAddressInput {
    #[validate(length(min = 1, max = 100))]
    pub recipient: Option<String>,
    #[validate(length(min = 5, max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub line1: Option<String>,
    #[validate(length(max = 200))]
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub region: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: Option<String>,
    #[validate(length(min = 2, max = 2))]
    pub country: Option<String>,
    pub is_default: Option<bool>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateAddressInput,
    ) -> Result<address::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        if input.is_default {
            Self::clear_default(&txn, user_id).await?;
        }

        let created = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            recipient: Set(input.recipient),
            phone: Set(input.phone),
            line1: Set(input.line1),
            line2: Set(input.line2),
            city: Set(input.city),
            region: Set(Some(input.region)),
            postal_code: Set(Some(input.postal_code)),
            country: Set(input.country.to_uppercase()),
            is_default: Set(input.is_default),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok(created)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<address::Model>, ServiceError> {
        Ok(address::Entity::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_desc(address::Column::IsDefault)
            .order_by_desc(address::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<address::Model, ServiceError> {
        address::Entity::find_by_id(address_id)
            .filter(address::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", address_id)))
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        input: UpdateAddressInput,
    ) -> Result<address::Model, ServiceError> {
        input.validate()?;
        let existing = self.get(user_id, address_id).await?;

        let txn = self.db.begin().await?;
        if input.is_default == Some(true) && !existing.is_default {
            Self::clear_default(&txn, user_id).await?;
        }

        let mut model: address::ActiveModel = existing.into();
        if let Some(recipient) = input.recipient {
            model.recipient = Set(recipient);
        }
        if let Some(phone) = input.phone {
            model.phone = Set(phone);
        }
        if let Some(line1) = input.line1 {
            model.line1 = Set(line1);
        }
        if let Some(line2) = input.line2 {
            model.line2 = Set(Some(line2));
        }
        if let Some(city) = input.city {
            model.city = Set(city);
        }
        if let Some(region) = input.region {
            model.region = Set(Some(region));
        }
        if let Some(postal_code) = input.postal_code {
            model.postal_code = Set(Some(postal_code));
        }
        if let Some(country) = input.country {
            model.country = Set(country.to_uppercase());
        }
        if let Some(is_default) = input.is_default {
            model.is_default = Set(is_default);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&txn).await?;
        txn.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, address_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(user_id, address_id).await?;
        existing.delete(&*self.db).await?;
        Ok(())
    }

    /// At most one default address per user.
    async fn clear_default<C: sea_orm::ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        address::Entity::update_many()
            .col_expr(address::Column::IsDefault, Expr::value(false))
            .filter(address::Column::UserId.eq(user_id))
            .filter(address::Column::IsDefault.eq(true))
            .exec(conn)
            .await?;
        Ok(())
    }
}
