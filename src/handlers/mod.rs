//! HTTP layer. Handlers stay thin: extract, validate, call the service,
//! wrap the result.

pub mod addresses;
pub mod auth;
pub mod carts;
pub mod checkout;
pub mod common;
pub mod coupons;
pub mod favorites;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

use crate::auth::AuthService;
use crate::cache::CacheBackend;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    AddressService, CartService, CatalogService, CheckoutService, CouponService, FavoriteService,
    InventoryService, NotificationService, OrderService, ReviewService, UserService,
};
use std::sync::Arc;

pub use crate::AppState;

/// Service container handed to every handler through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub catalog: Arc<CatalogService>,
    pub inventory: Arc<InventoryService>,
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderService>,
    pub coupons: Arc<CouponService>,
    pub favorites: Arc<FavoriteService>,
    pub notifications: Arc<NotificationService>,
    pub addresses: Arc<AddressService>,
    pub reviews: Arc<ReviewService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<AuthService>,
        cache: Arc<dyn CacheBackend>,
        config: Arc<AppConfig>,
    ) -> Self {
        let coupons = CouponService::new(db.clone(), event_sender.clone());

        Self {
            users: Arc::new(UserService::new(
                db.clone(),
                auth_service,
                cache,
                event_sender.clone(),
                config.clone(),
            )),
            catalog: Arc::new(CatalogService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            inventory: Arc::new(InventoryService::new(db.clone(), event_sender.clone())),
            cart: Arc::new(CartService::new(db.clone(), event_sender.clone(), config)),
            checkout: Arc::new(CheckoutService::new(
                db.clone(),
                event_sender.clone(),
                coupons.clone(),
            )),
            orders: Arc::new(OrderService::new(db.clone(), event_sender.clone())),
            coupons: Arc::new(coupons),
            favorites: Arc::new(FavoriteService::new(db.clone())),
            notifications: Arc::new(NotificationService::new(db.clone())),
            addresses: Arc::new(AddressService::new(db.clone())),
            reviews: Arc::new(ReviewService::new(db, event_sender)),
        }
    }
}
