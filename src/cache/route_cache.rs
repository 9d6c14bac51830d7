//! Cache de secuencias optimizadas
//!
//! Guarda el orden de paradas devuelto por el optimizador externo,
//! indexado por checksum md5 del conjunto de coordenadas. Evita
//! repetir llamadas de red para el mismo problema.

use tracing::debug;

use super::{CacheOperations, RedisClient};

/// TTL corto: las sugerencias de ruta son advisory y toleran staleness
const ROUTE_PLAN_TTL_SECS: u64 = 600;

#[derive(Clone)]
pub struct RouteCache {
    client: RedisClient,
}

impl RouteCache {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Checksum estable del problema de secuenciación
    pub fn checksum(parts: &[String]) -> String {
        let joined = parts.join("|");
        format!("{:x}", md5::compute(joined.as_bytes()))
    }

    /// Obtener un orden de paradas cacheado (None en cualquier error)
    pub async fn get_order(&self, checksum: &str) -> Option<Vec<String>> {
        let key = self.client.make_key("route_order", checksum);
        match self.client.get::<Vec<String>>(&key).await {
            Ok(order) => order,
            Err(e) => {
                debug!("Cache de rutas ilegible ({}), se ignora", e);
                None
            }
        }
    }

    /// Guardar un orden de paradas; los errores se ignoran
    pub async fn store_order(&self, checksum: &str, order: &Vec<String>) {
        let key = self.client.make_key("route_order", checksum);
        if let Err(e) = self.client.set(&key, order, ROUTE_PLAN_TTL_SECS).await {
            debug!("No se pudo cachear la ruta ({}), se ignora", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable() {
        let parts = vec!["28.6139,77.2090".to_string(), "19.0760,72.8777".to_string()];
        assert_eq!(RouteCache::checksum(&parts), RouteCache::checksum(&parts.clone()));
    }

    #[test]
    fn test_checksum_depends_on_order() {
        let a = vec!["a".to_string(), "b".to_string()];
        let b = vec!["b".to_string(), "a".to_string()];
        assert_ne!(RouteCache::checksum(&a), RouteCache::checksum(&b));
    }
}
