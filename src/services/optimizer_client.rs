//! Cliente del optimizador de secuencias de puntos
//!
//! El optimizador externo es una dependencia blanda: se modela como un
//! trait con dos implementaciones (llamada remota con timeout acotado y
//! heurística local nearest-neighbor). La decisión de fallback vive en
//! el secuenciador, en un solo lugar, nunca regada por la lógica de
//! negocio.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::geocoding_service::{haversine_km, Coordinates};

/// Una parada identificada con coordenadas resueltas
#[derive(Debug, Clone, Serialize)]
pub struct OptimizerStop {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Contrato del secuenciador de puntos: recibe un inicio y paradas,
/// devuelve los IDs en orden de visita.
#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    async fn sequence_stops(&self, start: Coordinates, stops: &[OptimizerStop]) -> Result<Vec<String>>;
}

#[derive(Debug, Serialize)]
struct RemoteSequenceRequest<'a> {
    start: RemotePoint,
    stops: &'a [OptimizerStop],
}

#[derive(Debug, Serialize)]
struct RemotePoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct RemoteOrderedStop {
    id: String,
    #[allow(dead_code)]
    latitude: f64,
    #[allow(dead_code)]
    longitude: f64,
}

/// Implementación remota sobre HTTP con timeout acotado
pub struct RemoteOptimizer {
    base_url: String,
    client: Client,
}

impl RemoteOptimizer {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl RouteOptimizer for RemoteOptimizer {
    async fn sequence_stops(&self, start: Coordinates, stops: &[OptimizerStop]) -> Result<Vec<String>> {
        let url = format!("{}/optimize", self.base_url.trim_end_matches('/'));

        let request = RemoteSequenceRequest {
            start: RemotePoint {
                latitude: start.latitude,
                longitude: start.longitude,
            },
            stops,
        };

        log::info!("📤 Enviando {} paradas al optimizador: {}", stops.len(), url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Optimizer error {}: {}", status, body));
        }

        let ordered: Vec<RemoteOrderedStop> = response.json().await?;
        if ordered.len() != stops.len() {
            return Err(anyhow!(
                "Optimizer returned {} stops, expected {}",
                ordered.len(),
                stops.len()
            ));
        }

        Ok(ordered.into_iter().map(|s| s.id).collect())
    }
}

/// Heurística local greedy: visitar siempre la parada no visitada
/// más cercana (great-circle) a la posición actual.
#[derive(Debug, Default)]
pub struct NearestNeighborOptimizer;

#[async_trait]
impl RouteOptimizer for NearestNeighborOptimizer {
    async fn sequence_stops(&self, start: Coordinates, stops: &[OptimizerStop]) -> Result<Vec<String>> {
        Ok(nearest_neighbor_order(start, stops))
    }
}

pub fn nearest_neighbor_order(start: Coordinates, stops: &[OptimizerStop]) -> Vec<String> {
    let mut current = start;
    let mut visited = vec![false; stops.len()];
    let mut order = Vec::with_capacity(stops.len());

    for _ in 0..stops.len() {
        let mut nearest_idx = None;
        let mut min_dist = f64::MAX;

        for (idx, stop) in stops.iter().enumerate() {
            if visited[idx] {
                continue;
            }
            let dist = haversine_km(
                current,
                Coordinates {
                    latitude: stop.latitude,
                    longitude: stop.longitude,
                },
            );
            if dist < min_dist {
                min_dist = dist;
                nearest_idx = Some(idx);
            }
        }

        if let Some(idx) = nearest_idx {
            visited[idx] = true;
            current = Coordinates {
                latitude: stops[idx].latitude,
                longitude: stops[idx].longitude,
            };
            order.push(stops[idx].id.clone());
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str, lat: f64, lng: f64) -> OptimizerStop {
        OptimizerStop {
            id: id.to_string(),
            latitude: lat,
            longitude: lng,
        }
    }

    #[tokio::test]
    async fn test_nearest_neighbor_visits_closest_first() {
        let start = Coordinates { latitude: 28.6139, longitude: 77.2090 }; // Delhi
        let stops = vec![
            stop("mumbai", 19.0760, 72.8777),
            stop("jaipur", 26.9124, 75.7873),
            stop("agra", 27.1767, 78.0081),
        ];

        let order = NearestNeighborOptimizer
            .sequence_stops(start, &stops)
            .await
            .unwrap();

        // Desde Delhi: Agra (~180 km) antes que Jaipur (~240 km), Mumbai al final
        assert_eq!(order, vec!["agra", "jaipur", "mumbai"]);
    }

    #[tokio::test]
    async fn test_nearest_neighbor_empty() {
        let order = NearestNeighborOptimizer
            .sequence_stops(Coordinates { latitude: 0.0, longitude: 0.0 }, &[])
            .await
            .unwrap();
        assert!(order.is_empty());
    }

    #[tokio::test]
    async fn test_nearest_neighbor_covers_all_stops() {
        let start = Coordinates { latitude: 22.0, longitude: 78.0 };
        let stops: Vec<_> = (0..10)
            .map(|i| stop(&format!("s{}", i), 20.0 + i as f64, 75.0))
            .collect();

        let order = nearest_neighbor_order(start, &stops);
        assert_eq!(order.len(), 10);
        let mut sorted = order.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 10);
    }
}
