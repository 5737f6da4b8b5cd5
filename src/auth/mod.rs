//! JWT issuance/validation, password hashing, and the request
//! authentication middleware.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::user::UserRole;

pub const ADMIN_ROLE: &str = "admin";

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    /// "access" or "refresh"
    pub kind: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            access_token_expiration: Duration::from_secs(cfg.jwt_expiration as u64),
            refresh_token_expiration: Duration::from_secs(cfg.refresh_token_expiration as u64),
        }
    }
}

/// Access + refresh token pair returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Failed to create token: {0}")]
    TokenCreation(String),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingAuth | AuthError::InvalidToken | AuthError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::TokenCreation(_) | AuthError::Hashing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        }));
        (status, body).into_response()
    }
}

/// Authentication service that handles token issuance and validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Generate an access/refresh token pair for a user
    pub fn generate_token_pair(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;
        let refresh_exp = now
            + ChronoDuration::from_std(self.config.refresh_token_expiration)
                .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let access_token = self.encode_claims(Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.as_str().to_string(),
            kind: "access".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        })?;

        let refresh_token = self.encode_claims(Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.as_str().to_string(),
            kind: "refresh".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: refresh_exp.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
        })
    }

    fn encode_claims(&self, claims: Claims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.clone()]);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        Ok(claims)
    }

    /// Validate an access token specifically (refresh tokens are rejected)
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.validate_token(token)?;
        if claims.kind != "access" {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Validate a refresh token and return the claims for re-issuance
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.validate_token(token)?;
        if claims.kind != "refresh" {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Hash a password with argon2
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Verify a password against a stored argon2 hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Role middleware to check if a user has the required role
pub async fn role_middleware(
    State(required_role): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match request.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => return Err(AuthError::MissingAuth),
    };

    if !user.has_role(&required_role) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(&headers, &auth_service) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if let Some(token) = auth_value.strip_prefix("Bearer ") {
                let claims = auth_service.validate_access_token(token.trim())?;
                let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

                return Ok(AuthUser {
                    id,
                    email: claims.email,
                    role: claims.role,
                });
            }
        }
    }

    Err(AuthError::MissingAuth)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_role(self, role: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, role: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            role.to_string(),
            role_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: "unit_test_secret_key_that_is_long_enough_12345".to_string(),
            jwt_audience: "storefront-api".to_string(),
            jwt_issuer: "storefront-auth".to_string(),
            access_token_expiration: Duration::from_secs(3600),
            refresh_token_expiration: Duration::from_secs(86_400),
        })
    }

    #[test]
    fn token_round_trip() {
        let svc = test_service();
        let user_id = Uuid::new_v4();
        let pair = svc
            .generate_token_pair(user_id, "a@example.com", UserRole::Customer)
            .unwrap();

        let claims = svc.validate_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.role, "customer");
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        let svc = test_service();
        let pair = svc
            .generate_token_pair(Uuid::new_v4(), "a@example.com", UserRole::Customer)
            .unwrap();

        assert!(svc.validate_access_token(&pair.refresh_token).is_err());
        assert!(svc.validate_refresh_token(&pair.refresh_token).is_ok());
        assert!(svc.validate_refresh_token(&pair.access_token).is_err());
    }

    #[test]
    fn tampered_token_rejected() {
        let svc = test_service();
        let pair = svc
            .generate_token_pair(Uuid::new_v4(), "a@example.com", UserRole::Admin)
            .unwrap();
        let mut token = pair.access_token;
        token.push('x');
        assert!(svc.validate_access_token(&token).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let svc = test_service();
        let hash = svc.hash_password("hunter2!").unwrap();
        assert!(svc.verify_password("hunter2!", &hash).unwrap());
        assert!(!svc.verify_password("wrong", &hash).unwrap());
    }
}
