//! Business logic layer. Handlers stay thin; everything that touches the
//! database or enforces an invariant lives here.

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod coupons;
pub mod favorites;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod reviews;
pub mod users;

pub use addresses::AddressService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use coupons::CouponService;
pub use favorites::FavoriteService;
pub use inventory::InventoryService;
pub use notifications::NotificationService;
pub use orders::OrderService;
pub use reviews::ReviewService;
pub use users::UserService;
