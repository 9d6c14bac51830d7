//! Cache
//!
//! Este módulo contiene el cache Redis para la ruta advisory
//! (resultados del optimizador externo). Los fallos de cache nunca
//! fallan una operación.

pub mod cache_config;
pub mod redis_client;
pub mod route_cache;

pub use cache_config::{CacheConfig, CacheOperations};
pub use redis_client::RedisClient;
pub use route_cache::RouteCache;
