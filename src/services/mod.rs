pub mod admin_service;
pub mod analytics_service;
pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod convert;
pub mod media_service;
pub mod payment_service;
pub mod reels_service;
pub mod reservation_service;
pub mod sku_service;
