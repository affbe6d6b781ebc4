use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    events::EventBus,
    services::media_service::proxy_client,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub events: EventBus,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, config: AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            pool,
            orm,
            config: Arc::new(config),
            events: EventBus::new(256),
            http: proxy_client()?,
        })
    }
}
