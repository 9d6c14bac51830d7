//! Estado compartido de la aplicación
//!
//! Este módulo define el estado que se pasa a través del router de
//! Axum. Redis es opcional: sin cache el servicio funciona igual, solo
//! repite llamadas al optimizador.

use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

use crate::cache::{RedisClient, RouteCache};
use crate::config::environment::EnvironmentConfig;
use crate::services::geocoding_service::GeocodingService;
use crate::services::ml_client::MlClient;
use crate::services::optimizer_client::RouteOptimizer;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub redis: Option<RedisClient>,
    pub route_cache: Option<RouteCache>,
    pub http_client: Client,
    pub optimizer: Arc<dyn RouteOptimizer>,
    pub geocoder: GeocodingService,
    pub ml: MlClient,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: EnvironmentConfig,
        redis: Option<RedisClient>,
        optimizer: Arc<dyn RouteOptimizer>,
    ) -> Self {
        let route_cache = redis.clone().map(RouteCache::new);
        let ml = MlClient::new(config.ml_service_url.clone(), config.ml_service_timeout);

        Self {
            pool,
            config,
            redis,
            route_cache,
            http_client: Client::new(),
            optimizer,
            geocoder: GeocodingService::new(),
            ml,
        }
    }
}
