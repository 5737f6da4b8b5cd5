use crate::{
    auth::{AuthService, TokenPair},
    cache::CacheBackend,
    config::AppConfig,
    entities::user::{self, UserRole},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Consecutive failed logins that trigger a lock.
pub const MAX_FAILED_LOGINS: i32 = 5;
/// How long a lock lasts.
pub const LOCKOUT_MINUTES: i64 = 30;
/// Password-reset codes are six digits.
const OTP_MIN: u32 = 100_000;
const OTP_MAX: u32 = 999_999;

/// Accounts: registration, login with the failed-attempt lockout, token
/// refresh, and OTP password resets.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
    cache: Arc<dyn CacheBackend>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 6))]
    pub otp: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: user::Model,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

fn otp_cache_key(email: &str) -> String {
    format!("otp:{}", email.to_lowercase())
}

impl UserService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        auth: Arc<AuthService>,
        cache: Arc<dyn CacheBackend>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            auth,
            cache,
            event_sender,
            config,
        }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = self
            .auth
            .hash_password(&input.password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            full_name: Set(input.full_name),
            phone: Set(input.phone),
            role: Set(UserRole::Customer),
            is_active: Set(true),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&*self.db).await?;

        info!(user_id = %created.id, "User registered");
        self.event_sender
            .send_or_log(Event::UserRegistered(created.id))
            .await;
        Ok(created)
    }

    /// Login with the lockout state machine: five consecutive failures
    /// lock the account for thirty minutes; a success resets the counter.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<LoginResponse, ServiceError> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".to_string()))?;

        if !user.is_active {
            return Err(ServiceError::Forbidden(
                "This account has been deactivated".to_string(),
            ));
        }

        let now = Utc::now();
        if let Some(locked_until) = user.locked_until {
            if locked_until > now {
                let remaining = (locked_until - now).num_minutes() + 1;
                return Err(ServiceError::AccountLocked(format!(
                    "Account locked. Try again in {} minutes",
                    remaining
                )));
            }
        }

        let password_ok = self
            .auth
            .verify_password(&input.password, &user.password_hash)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        if !password_ok {
            // An expired lock means the account is back in the unlocked
            // state; the failure count restarts instead of compounding.
            let lock_expired = user.locked_until.is_some();
            let attempts = if lock_expired {
                1
            } else {
                user.failed_login_attempts + 1
            };
            let user_id = user.id;
            let mut model: user::ActiveModel = user.into();
            model.failed_login_attempts = Set(attempts);
            model.locked_until = Set(None);
            if attempts >= MAX_FAILED_LOGINS {
                model.locked_until = Set(Some(now + ChronoDuration::minutes(LOCKOUT_MINUTES)));
                warn!(user_id = %user_id, attempts, "Account locked after repeated failures");
            }
            model.updated_at = Set(now);
            model.update(&*self.db).await?;

            return Err(ServiceError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        // Success clears the failure state.
        let mut model: user::ActiveModel = user.clone().into();
        model.failed_login_attempts = Set(0);
        model.locked_until = Set(None);
        model.last_login_at = Set(Some(now));
        model.updated_at = Set(now);
        let user = model.update(&*self.db).await?;

        let tokens = self
            .auth
            .generate_token_pair(user.id, &user.email, user.role)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        info!(user_id = %user.id, "Login succeeded");
        Ok(LoginResponse { user, tokens })
    }

    /// New token pair from a valid refresh token.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self
            .auth
            .validate_refresh_token(refresh_token)
            .map_err(|_| ServiceError::Unauthorized("Invalid refresh token".to_string()))?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid refresh token".to_string()))?;

        // Re-read the user so deactivation and role changes take effect.
        let user = self.get_user(user_id).await?;
        if !user.is_active {
            return Err(ServiceError::Forbidden(
                "This account has been deactivated".to_string(),
            ));
        }

        self.auth
            .generate_token_pair(user.id, &user.email, user.role)
            .map_err(|e| ServiceError::InternalError(e.to_string()))
    }

    /// Issues a six-digit reset code with a TTL. The response is the same
    /// whether or not the account exists, to avoid leaking addresses; the
    /// code is logged in place of mail delivery.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), ServiceError> {
        let email = email.trim().to_lowercase();
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await?;

        if user.is_none() {
            info!("Password reset requested for unknown email");
            return Ok(());
        }

        let otp: u32 = rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX);
        self.cache
            .set(
                &otp_cache_key(&email),
                &otp.to_string(),
                Some(Duration::from_secs(self.config.otp_ttl_secs)),
            )
            .await
            .map_err(|e| ServiceError::CacheError(e.to_string()))?;

        // Mail transport is an operational concern; the OTP is surfaced
        // through the logs for now.
        info!(email = %email, otp = %otp, "Password reset code issued");
        Ok(())
    }

    /// Verifies the OTP (single use) and replaces the password. A
    /// successful reset also clears any login lock.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<(), ServiceError> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();
        let key = otp_cache_key(&email);

        let stored = self
            .cache
            .get(&key)
            .await
            .map_err(|e| ServiceError::CacheError(e.to_string()))?;
        match stored {
            Some(code) if code == input.otp => {}
            _ => {
                return Err(ServiceError::Unauthorized(
                    "Invalid or expired reset code".to_string(),
                ));
            }
        }

        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid or expired reset code".to_string()))?;

        let password_hash = self
            .auth
            .hash_password(&input.new_password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let user_id = user.id;
        let mut model: user::ActiveModel = user.into();
        model.password_hash = Set(password_hash);
        model.failed_login_attempts = Set(0);
        model.locked_until = Set(None);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;

        // Single use: burn the code on success.
        self.cache
            .delete(&key)
            .await
            .map_err(|e| ServiceError::CacheError(e.to_string()))?;

        info!(user_id = %user_id, "Password reset");
        self.event_sender
            .send_or_log(Event::PasswordChanged(user_id))
            .await;
        Ok(())
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }

    // ---- admin ----

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<user::Model>, u64), ServiceError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let total = user::Entity::find().count(&*self.db).await?;
        let items = user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .offset((page - 1) * limit)
            .limit(limit)
            .all(&*self.db)
            .await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn set_active(
        &self,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<user::Model, ServiceError> {
        let user = self.get_user(user_id).await?;
        let mut model: user::ActiveModel = user.into();
        model.is_active = Set(is_active);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lockout_threshold_constants() {
        // The lockout arithmetic services rely on.
        assert_eq!(MAX_FAILED_LOGINS, 5);
        assert_eq!(LOCKOUT_MINUTES, 30);
    }

    #[test]
    fn otp_key_is_case_insensitive() {
        assert_eq!(otp_cache_key("A@Example.com"), otp_cache_key("a@example.com"));
    }
}
