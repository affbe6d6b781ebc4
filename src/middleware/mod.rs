pub mod auth;
pub mod cart_token;
pub mod rate_limit;
