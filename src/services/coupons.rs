use crate::{
    entities::{
        coupon::{self, DiscountType},
        user_coupon::{self, UserCouponStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Coupon catalog, per-user grants, quoting and redemption.
///
/// Quoting is a pure read. Redemption only ever happens through
/// [`CouponService::consume_in_txn`] inside the checkout transaction, so
/// a failed checkout can never burn a use.
#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCouponInput {
    #[validate(length(min = 3, max = 50))]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    #[serde(default)]
    pub min_order_value: Decimal,
    #[validate(range(min = 1, max = 100))]
    pub usage_limit_per_user: i32,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of a coupon quote: what the discount would be, with nothing
/// consumed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CouponQuote {
    pub coupon_id: Uuid,
    pub code: String,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

/// Computes the discount a coupon yields on `subtotal`. Percentage
/// discounts are capped by `max_discount_amount`; no discount ever
/// exceeds the subtotal.
pub fn compute_discount(coupon: &coupon::Model, subtotal: Decimal) -> Decimal {
    let raw = match coupon.discount_type {
        DiscountType::Percentage => subtotal * coupon.discount_value / Decimal::from(100),
        DiscountType::Fixed => coupon.discount_value,
    };

    let capped = match (coupon.discount_type, coupon.max_discount_amount) {
        (DiscountType::Percentage, Some(cap)) => raw.min(cap),
        _ => raw,
    };

    capped.min(subtotal).max(Decimal::ZERO)
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // ---- admin CRUD ----

    #[instrument(skip(self, input))]
    pub async fn create_coupon(
        &self,
        input: CreateCouponInput,
    ) -> Result<coupon::Model, ServiceError> {
        input.validate()?;

        if input.expires_at <= input.starts_at {
            return Err(ServiceError::ValidationError(
                "expires_at must be after starts_at".to_string(),
            ));
        }
        if input.discount_value <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "discount_value must be positive".to_string(),
            ));
        }
        if input.discount_type == DiscountType::Percentage
            && input.discount_value > Decimal::from(100)
        {
            return Err(ServiceError::ValidationError(
                "Percentage discount cannot exceed 100".to_string(),
            ));
        }

        let code = input.code.trim().to_uppercase();
        let existing = coupon::Entity::find()
            .filter(coupon::Column::Code.eq(code.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Coupon code '{}' already exists",
                code
            )));
        }

        let now = Utc::now();
        let model = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            description: Set(input.description),
            discount_type: Set(input.discount_type),
            discount_value: Set(input.discount_value),
            max_discount_amount: Set(input.max_discount_amount),
            min_order_value: Set(input.min_order_value),
            usage_limit_per_user: Set(input.usage_limit_per_user),
            starts_at: Set(input.starts_at),
            expires_at: Set(input.expires_at),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;
        info!(coupon_id = %created.id, code = %created.code, "Coupon created");
        Ok(created)
    }

    pub async fn list_coupons(&self) -> Result<Vec<coupon::Model>, ServiceError> {
        Ok(coupon::Entity::find()
            .order_by_desc(coupon::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_coupon(&self, coupon_id: Uuid) -> Result<coupon::Model, ServiceError> {
        coupon::Entity::find_by_id(coupon_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", coupon_id)))
    }

    #[instrument(skip(self))]
    pub async fn deactivate_coupon(&self, coupon_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_coupon(coupon_id).await?;
        let mut model: coupon::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;
        Ok(())
    }

    /// Grants a coupon to a user with the coupon's full per-user usage
    /// allowance. Granting twice is a conflict.
    #[instrument(skip(self))]
    pub async fn grant_to_user(
        &self,
        coupon_id: Uuid,
        user_id: Uuid,
    ) -> Result<user_coupon::Model, ServiceError> {
        let coupon = self.get_coupon(coupon_id).await?;
        if !coupon.is_active {
            return Err(ServiceError::CouponError(
                "Coupon is not active".to_string(),
            ));
        }

        let existing = user_coupon::Entity::find()
            .filter(user_coupon::Column::UserId.eq(user_id))
            .filter(user_coupon::Column::CouponId.eq(coupon_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "User already holds this coupon".to_string(),
            ));
        }

        let now = Utc::now();
        let model = user_coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            coupon_id: Set(coupon_id),
            usage_left: Set(coupon.usage_limit_per_user),
            status: Set(UserCouponStatus::Active),
            usage_history: Set(serde_json::json!([])),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let granted = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CouponClaimed { coupon_id, user_id })
            .await;
        Ok(granted)
    }

    /// The user's grants joined with their coupon definitions.
    pub async fn list_user_coupons(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(user_coupon::Model, Option<coupon::Model>)>, ServiceError> {
        Ok(user_coupon::Entity::find()
            .filter(user_coupon::Column::UserId.eq(user_id))
            .find_also_related(coupon::Entity)
            .order_by_desc(user_coupon::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    // ---- quoting & redemption ----

    /// Pure read: validates the coupon for this user and subtotal and
    /// returns the discount it would produce. Mutates nothing.
    #[instrument(skip(self))]
    pub async fn quote(
        &self,
        code: &str,
        user_id: Uuid,
        subtotal: Decimal,
    ) -> Result<CouponQuote, ServiceError> {
        let (coupon, _grant) = self.validate_for_user(code, user_id, subtotal).await?;
        let discount_amount = compute_discount(&coupon, subtotal);

        Ok(CouponQuote {
            coupon_id: coupon.id,
            code: coupon.code,
            discount_amount,
            final_amount: subtotal - discount_amount,
        })
    }

    /// Validates code, window, min order value and the user's grant.
    pub(crate) async fn validate_for_user(
        &self,
        code: &str,
        user_id: Uuid,
        subtotal: Decimal,
    ) -> Result<(coupon::Model, user_coupon::Model), ServiceError> {
        let code = code.trim().to_uppercase();
        let coupon = coupon::Entity::find()
            .filter(coupon::Column::Code.eq(code.clone()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::CouponError("Unknown coupon code".to_string()))?;

        if !coupon.is_active {
            return Err(ServiceError::CouponError(
                "Coupon is not active".to_string(),
            ));
        }
        let now = Utc::now();
        if now < coupon.starts_at || now > coupon.expires_at {
            return Err(ServiceError::CouponError(
                "Coupon is not currently valid".to_string(),
            ));
        }
        if subtotal < coupon.min_order_value {
            return Err(ServiceError::CouponError(format!(
                "Order total below the coupon minimum of {}",
                coupon.min_order_value
            )));
        }

        let grant = user_coupon::Entity::find()
            .filter(user_coupon::Column::UserId.eq(user_id))
            .filter(user_coupon::Column::CouponId.eq(coupon.id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::CouponError("You do not hold this coupon".to_string()))?;

        if grant.status != UserCouponStatus::Active || grant.usage_left <= 0 {
            return Err(ServiceError::CouponError(
                "Coupon has already been used".to_string(),
            ));
        }

        Ok((coupon, grant))
    }

    /// Consumes one use of a grant inside the caller's transaction.
    ///
    /// The decrement is conditional on `usage_left >= 1`, so two
    /// concurrent checkouts racing on the last use cannot both win.
    pub(crate) async fn consume_in_txn<C: ConnectionTrait>(
        &self,
        txn: &C,
        grant_id: Uuid,
        order_id: Uuid,
        discount_amount: Decimal,
    ) -> Result<(), ServiceError> {
        let res = user_coupon::Entity::update_many()
            .col_expr(
                user_coupon::Column::UsageLeft,
                Expr::col(user_coupon::Column::UsageLeft).sub(1),
            )
            .filter(user_coupon::Column::Id.eq(grant_id))
            .filter(user_coupon::Column::UsageLeft.gte(1))
            .exec(txn)
            .await?;

        if res.rows_affected == 0 {
            warn!(grant_id = %grant_id, "Coupon consumption refused");
            return Err(ServiceError::CouponError(
                "Coupon has already been used".to_string(),
            ));
        }

        // Reload within the transaction to append history and settle the
        // status.
        let grant = user_coupon::Entity::find_by_id(grant_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon grant {} not found", grant_id)))?;

        let mut history = grant
            .usage_history
            .as_array()
            .cloned()
            .unwrap_or_default();
        history.push(serde_json::json!({
            "order_id": order_id,
            "used_at": Utc::now().to_rfc3339(),
            "discount_amount": discount_amount,
        }));

        let exhausted = grant.usage_left == 0;
        let mut model: user_coupon::ActiveModel = grant.into();
        model.usage_history = Set(serde_json::Value::Array(history));
        if exhausted {
            model.status = Set(UserCouponStatus::Used);
        }
        model.updated_at = Set(Utc::now());
        model.update(txn).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn coupon_model(
        discount_type: DiscountType,
        value: Decimal,
        cap: Option<Decimal>,
        min: Decimal,
    ) -> coupon::Model {
        let now = Utc::now();
        coupon::Model {
            id: Uuid::new_v4(),
            code: "TEST".to_string(),
            description: None,
            discount_type,
            discount_value: value,
            max_discount_amount: cap,
            min_order_value: min,
            usage_limit_per_user: 1,
            starts_at: now,
            expires_at: now,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percentage_discount() {
        let c = coupon_model(DiscountType::Percentage, dec!(10), None, Decimal::ZERO);
        assert_eq!(compute_discount(&c, dec!(200)), dec!(20));
    }

    #[test]
    fn percentage_capped() {
        let c = coupon_model(
            DiscountType::Percentage,
            dec!(50),
            Some(dec!(30)),
            Decimal::ZERO,
        );
        assert_eq!(compute_discount(&c, dec!(200)), dec!(30));
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let c = coupon_model(DiscountType::Fixed, dec!(25), None, Decimal::ZERO);
        assert_eq!(compute_discount(&c, dec!(100)), dec!(25));
        assert_eq!(compute_discount(&c, dec!(10)), dec!(10));
    }

    #[test]
    fn fixed_cap_is_ignored() {
        // max_discount_amount only applies to percentage coupons
        let c = coupon_model(DiscountType::Fixed, dec!(25), Some(dec!(5)), Decimal::ZERO);
        assert_eq!(compute_discount(&c, dec!(100)), dec!(25));
    }
}
