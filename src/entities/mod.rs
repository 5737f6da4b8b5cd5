//! Database entities (sea-orm models).

pub mod address;
pub mod cart;
pub mod cart_item;
pub mod category;
pub mod coupon;
pub mod favorite;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_color;
pub mod review;
pub mod size_stock;
pub mod target;
pub mod user;
pub mod user_coupon;
pub mod user_notification;
