//! Test harness: a full application router backed by a throwaway SQLite
//! database, plus helpers for seeding users and catalog data.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::{
    auth::{AuthConfig, AuthService},
    cache::{CacheBackend, InMemoryCache},
    config::AppConfig,
    db,
    entities::{product, product_color, size_stock, user::UserRole},
    events,
    handlers::AppServices,
    services::catalog::{CreateColorInput, CreateProductInput, CreateSizeStockInput},
    AppState,
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub cache: Arc<dyn CacheBackend>,
    _event_task: tokio::task::JoinHandle<()>,
    _tmp: TempDir,
}

pub struct SeededSku {
    pub product: product::Model,
    pub color: product_color::Model,
    pub size_stock: size_stock::Model,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("temp dir");
        let db_path = tmp.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("test database");
        db::run_migrations(&pool).await.expect("migrations");
        let db = Arc::new(pool);

        let (event_sender, event_rx) = events::create_event_channel(64);
        let event_sender = Arc::new(event_sender);
        let event_task = tokio::spawn(events::process_events(event_rx, db.clone()));

        let config = Arc::new(cfg);
        let auth_service = Arc::new(AuthService::new(AuthConfig::from(&*config)));
        let cache: Arc<dyn CacheBackend> = Arc::new(InMemoryCache::new());

        let services = AppServices::new(
            db.clone(),
            event_sender.clone(),
            auth_service.clone(),
            cache.clone(),
            config.clone(),
        );

        let state = AppState {
            config,
            db,
            event_sender,
            auth_service,
            services,
        };
        let router = storefront_api::build_router(state.clone());

        Self {
            router,
            state,
            cache,
            _event_task: event_task,
            _tmp: tmp,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };
        let request = builder.body(body).expect("request");

        self.router.clone().oneshot(request).await.expect("response")
    }

    /// Registers a customer and returns `(user_id, access_token)`.
    pub async fn register_and_login(&self, email: &str, password: &str) -> (Uuid, String) {
        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": password,
                    "full_name": "Test Customer",
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        let user_id = Uuid::parse_str(body["data"]["id"].as_str().expect("user id")).unwrap();

        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        let token = body["data"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string();

        (user_id, token)
    }

    /// Mints an admin bearer token without touching the database. The auth
    /// middleware trusts claims, so this is enough for role-gated routes.
    pub fn admin_token(&self) -> String {
        self.state
            .auth_service
            .generate_token_pair(Uuid::new_v4(), "admin@test.local", UserRole::Admin)
            .expect("admin token")
            .access_token
    }

    /// Seeds a product with one color and one size stock unit.
    pub async fn seed_sku(&self, name: &str, price: Decimal, stock: i32) -> SeededSku {
        let catalog = &self.state.services.catalog;
        let product = catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                slug: None,
                description: None,
                base_price: price,
                category_id: None,
                target_id: None,
            })
            .await
            .expect("seed product");
        let color = catalog
            .add_color(
                product.id,
                CreateColorInput {
                    name: "Black".to_string(),
                    hex_code: Some("#000000".to_string()),
                    position: None,
                },
            )
            .await
            .expect("seed color");
        let size_stock = catalog
            .add_size_stock(
                color.id,
                CreateSizeStockInput {
                    size: "M".to_string(),
                    initial_stock: stock,
                },
            )
            .await
            .expect("seed size stock");

        SeededSku {
            product,
            color,
            size_stock,
        }
    }

    /// Creates a shipping address for the user and returns its id.
    pub async fn seed_address(&self, token: &str) -> Uuid {
        let response = self
            .request(
                Method::POST,
                "/api/v1/addresses",
                Some(token),
                Some(json!({
                    "recipient": "Test Customer",
                    "phone": "5551234567",
                    "line1": "1 Test Street",
                    "city": "Testville",
                    "region": "TS",
                    "postal_code": "12345",
                    "country": "US",
                    "is_default": true,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        Uuid::parse_str(body["data"]["id"].as_str().expect("address id")).unwrap()
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Parses a JSON field produced by a `Decimal` (serialized as a string or
/// a bare number) for scale-insensitive comparison.
pub fn decimal_field(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal field: {other:?}"),
    }
}
