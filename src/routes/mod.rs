use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod doc;
pub mod events;
pub mod feed;
pub mod health;
pub mod media;
pub mod params;
pub mod payments;
pub mod reels;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> anyhow::Result<Router<AppState>> {
    let router = Router::new()
        .nest("/skus", catalog::router())
        .nest("/feed", feed::router())
        .nest("/reels", reels::router())
        .nest("/cart", cart::router())
        .nest("/orders", payments::router())
        .merge(media::router())
        .nest(
            "/admin",
            admin::router()
                .merge(auth::router()?)
                .merge(analytics::router())
                .merge(events::router()),
        );
    Ok(router)
}
