//! Secuenciador de rutas
//!
//! Expande envíos en paradas pickup/drop, delega el orden al optimizador
//! remoto (con cache Redis por checksum) y cae a nearest-neighbor local
//! cuando el remoto falla. Las métricas asumen velocidad media fija.

use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::RouteCache;
use crate::dto::routing_dto::{RouteMetrics, RoutePlanResponse, RouteWaypoint, WaypointKind};
use crate::models::shipment::Shipment;
use crate::repositories::{ShipmentRepository, TripSheetRepository, VehicleRepository};
use crate::utils::errors::{AppError, AppResult};

use super::geocoding_service::{
    haversine_km, Coordinates, GeocodingService, AVERAGE_SPEED_KMH, DEFAULT_ORIGIN,
};
use super::optimizer_client::{OptimizerStop, RouteOptimizer};

pub struct RoutingService {
    shipments: ShipmentRepository,
    vehicles: VehicleRepository,
    trip_sheets: TripSheetRepository,
    geocoder: GeocodingService,
    optimizer: Arc<dyn RouteOptimizer>,
    cache: Option<RouteCache>,
}

impl RoutingService {
    pub fn new(
        pool: sqlx::PgPool,
        geocoder: GeocodingService,
        optimizer: Arc<dyn RouteOptimizer>,
        cache: Option<RouteCache>,
    ) -> Self {
        Self {
            shipments: ShipmentRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            trip_sheets: TripSheetRepository::new(pool),
            geocoder,
            optimizer,
            cache,
        }
    }

    /// Secuenciar las paradas de un conjunto de envíos para un vehículo
    pub async fn sequence(
        &self,
        vehicle_id: Uuid,
        shipment_ids: &[Uuid],
    ) -> AppResult<RoutePlanResponse> {
        let vehicle = self
            .vehicles
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        let shipments = self.shipments.find_by_ids(shipment_ids).await?;
        let missing: Vec<String> = shipment_ids
            .iter()
            .filter(|id| !shipments.iter().any(|s| s.id == **id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::ShipmentsNotFound(missing));
        }

        log::info!(
            "🗺️ Secuenciando {} envíos para el vehículo {}",
            shipments.len(),
            vehicle.registration_number
        );

        self.build_plan(vehicle.id, &shipments).await
    }

    /// Plan sugerido para los envíos ya vinculados a una hoja de ruta
    pub async fn suggest_for_trip_sheet(&self, trip_sheet_id: Uuid) -> AppResult<RoutePlanResponse> {
        let sheet = self
            .trip_sheets
            .find_by_id(trip_sheet_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip sheet not found".to_string()))?;

        let vehicle_id = sheet.vehicle_id.ok_or(AppError::TripSheetHasNoVehicle)?;

        let shipments = self.shipments.find_by_trip_sheet(trip_sheet_id).await?;
        if shipments.is_empty() {
            return Err(AppError::BadRequest(
                "Trip sheet has no linked shipments".to_string(),
            ));
        }

        self.build_plan(vehicle_id, &shipments).await
    }

    async fn build_plan(
        &self,
        vehicle_id: Uuid,
        shipments: &[Shipment],
    ) -> AppResult<RoutePlanResponse> {
        let mut waypoints = expand_waypoints(shipments, &self.geocoder);

        // Solo las paradas con coordenadas participan en la optimización;
        // las no resueltas quedan al final en su orden original
        let stops: Vec<OptimizerStop> = waypoints
            .iter()
            .filter_map(|w| {
                Some(OptimizerStop {
                    id: waypoint_key(w.shipment_id, w.kind),
                    latitude: w.latitude?,
                    longitude: w.longitude?,
                })
            })
            .collect();

        let start = stops
            .iter()
            .find(|s| s.id.ends_with(":pickup"))
            .map(|s| Coordinates {
                latitude: s.latitude,
                longitude: s.longitude,
            })
            .unwrap_or(DEFAULT_ORIGIN);

        let (order, optimized_remotely) = self.resolve_order(start, &stops).await;
        waypoints = apply_order(waypoints, &order);

        let metrics = compute_metrics(&waypoints, start);
        stamp_sequence_and_etas(&mut waypoints, start);

        let errors = collect_ordering_violations(&waypoints);
        let is_valid = errors.is_empty();

        Ok(RoutePlanResponse {
            vehicle_id,
            waypoints,
            metrics,
            is_valid,
            errors,
            optimized_remotely,
        })
    }

    /// Orden de paradas: cache → optimizador remoto → nearest-neighbor local
    async fn resolve_order(&self, start: Coordinates, stops: &[OptimizerStop]) -> (Vec<String>, bool) {
        if stops.is_empty() {
            return (Vec::new(), false);
        }

        let parts: Vec<String> = stops
            .iter()
            .map(|s| format!("{}@{:.4},{:.4}", s.id, s.latitude, s.longitude))
            .collect();
        let checksum = RouteCache::checksum(&parts);

        if let Some(cache) = &self.cache {
            if let Some(order) = cache.get_order(&checksum).await {
                if order.len() == stops.len() {
                    log::debug!("📥 Orden de ruta servido desde cache ({})", checksum);
                    return (order, true);
                }
            }
        }

        match self.optimizer.sequence_stops(start, stops).await {
            Ok(order) => {
                if let Some(cache) = &self.cache {
                    cache.store_order(&checksum, &order).await;
                }
                (order, true)
            }
            Err(e) => {
                log::warn!(
                    "⚠️ Optimizador remoto falló ({}), usando nearest-neighbor local",
                    e
                );
                let order = super::optimizer_client::nearest_neighbor_order(start, stops);
                (order, false)
            }
        }
    }
}

fn waypoint_key(shipment_id: Uuid, kind: WaypointKind) -> String {
    let suffix = match kind {
        WaypointKind::Pickup => "pickup",
        WaypointKind::Drop => "drop",
    };
    format!("{}:{}", shipment_id, suffix)
}

/// Expandir cada envío en sus dos paradas con coordenadas resueltas
fn expand_waypoints(shipments: &[Shipment], geocoder: &GeocodingService) -> Vec<RouteWaypoint> {
    let mut waypoints = Vec::with_capacity(shipments.len() * 2);
    for shipment in shipments {
        let pickup_coords = geocoder.resolve(&shipment.origin);
        let drop_coords = geocoder.resolve(&shipment.destination);

        waypoints.push(RouteWaypoint {
            shipment_id: shipment.id,
            reference_number: shipment.reference_number.clone(),
            kind: WaypointKind::Pickup,
            address: shipment.origin.clone(),
            latitude: pickup_coords.map(|c| c.latitude),
            longitude: pickup_coords.map(|c| c.longitude),
            sequence: 0,
            eta: None,
        });
        waypoints.push(RouteWaypoint {
            shipment_id: shipment.id,
            reference_number: shipment.reference_number.clone(),
            kind: WaypointKind::Drop,
            address: shipment.destination.clone(),
            latitude: drop_coords.map(|c| c.latitude),
            longitude: drop_coords.map(|c| c.longitude),
            sequence: 0,
            eta: None,
        });
    }
    waypoints
}

/// Reordenar según el optimizador; las paradas sin coordenadas
/// conservan su orden relativo al final
fn apply_order(waypoints: Vec<RouteWaypoint>, order: &[String]) -> Vec<RouteWaypoint> {
    let mut by_key: HashMap<String, RouteWaypoint> = HashMap::new();
    let mut unresolved: Vec<RouteWaypoint> = Vec::new();

    for w in waypoints {
        if w.latitude.is_some() && w.longitude.is_some() {
            by_key.insert(waypoint_key(w.shipment_id, w.kind), w);
        } else {
            unresolved.push(w);
        }
    }

    let mut ordered: Vec<RouteWaypoint> = Vec::with_capacity(by_key.len() + unresolved.len());
    for key in order {
        if let Some(w) = by_key.remove(key) {
            ordered.push(w);
        }
    }
    // Paradas que el optimizador omitió (no debería pasar, pero nunca se pierden)
    let mut leftover: Vec<RouteWaypoint> = by_key.into_values().collect();
    leftover.sort_by_key(|w| (w.shipment_id, matches!(w.kind, WaypointKind::Drop)));
    ordered.extend(leftover);
    ordered.extend(unresolved);
    ordered
}

fn compute_metrics(waypoints: &[RouteWaypoint], start: Coordinates) -> RouteMetrics {
    let mut total_distance_km = 0.0;
    let mut current = start;
    let mut pickup_count = 0;
    let mut drop_count = 0;

    for w in waypoints {
        match w.kind {
            WaypointKind::Pickup => pickup_count += 1,
            WaypointKind::Drop => drop_count += 1,
        }
        if let (Some(lat), Some(lng)) = (w.latitude, w.longitude) {
            let next = Coordinates { latitude: lat, longitude: lng };
            total_distance_km += haversine_km(current, next);
            current = next;
        }
    }

    RouteMetrics {
        total_distance_km,
        total_duration_mins: total_distance_km / AVERAGE_SPEED_KMH * 60.0,
        pickup_count,
        drop_count,
    }
}

/// Numerar la secuencia y estampar ETAs acumulados desde ahora
fn stamp_sequence_and_etas(waypoints: &mut [RouteWaypoint], start: Coordinates) {
    let now = Utc::now();
    let mut current = start;
    let mut elapsed_mins = 0.0;

    for (idx, w) in waypoints.iter_mut().enumerate() {
        w.sequence = idx + 1;
        if let (Some(lat), Some(lng)) = (w.latitude, w.longitude) {
            let next = Coordinates { latitude: lat, longitude: lng };
            elapsed_mins += haversine_km(current, next) / AVERAGE_SPEED_KMH * 60.0;
            current = next;
            w.eta = Some(now + ChronoDuration::minutes(elapsed_mins as i64));
        }
    }
}

/// Recolectar TODOS los envíos cuyo drop quedó antes de su pickup
fn collect_ordering_violations(waypoints: &[RouteWaypoint]) -> Vec<String> {
    let mut pickup_pos: HashMap<Uuid, usize> = HashMap::new();
    let mut drop_pos: HashMap<Uuid, (usize, String)> = HashMap::new();

    for (idx, w) in waypoints.iter().enumerate() {
        match w.kind {
            WaypointKind::Pickup => {
                pickup_pos.insert(w.shipment_id, idx);
            }
            WaypointKind::Drop => {
                drop_pos.insert(w.shipment_id, (idx, w.reference_number.clone()));
            }
        }
    }

    let mut errors: Vec<(usize, String)> = Vec::new();
    for (shipment_id, (drop_idx, reference)) in &drop_pos {
        if let Some(pickup_idx) = pickup_pos.get(shipment_id) {
            if drop_idx < pickup_idx {
                errors.push((
                    *drop_idx,
                    format!("Shipment {} drop is sequenced before its pickup", reference),
                ));
            }
        }
    }
    errors.sort();
    errors.into_iter().map(|(_, msg)| msg).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::money::Money;
    use crate::models::shipment::ShipmentStatus;

    fn shipment(reference: &str, origin: &str, destination: &str) -> Shipment {
        Shipment {
            id: Uuid::new_v4(),
            reference_number: reference.to_string(),
            status: ShipmentStatus::Planned,
            origin: origin.to_string(),
            destination: destination.to_string(),
            scheduled_pickup_at: None,
            scheduled_drop_at: None,
            actual_pickup_at: None,
            actual_drop_at: None,
            weight_kg: None,
            price_minor: Money::ZERO,
            driver_id: None,
            vehicle_id: None,
            trip_sheet_id: None,
            trip_sequence: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_expand_produces_pickup_and_drop() {
        let geocoder = GeocodingService::new();
        let shipments = vec![shipment("FD-001", "Delhi", "Mumbai")];
        let waypoints = expand_waypoints(&shipments, &geocoder);

        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0].kind, WaypointKind::Pickup);
        assert_eq!(waypoints[1].kind, WaypointKind::Drop);
        assert!(waypoints[0].latitude.is_some());
        assert!(waypoints[1].latitude.is_some());
    }

    #[test]
    fn test_unresolved_addresses_have_no_coordinates() {
        let geocoder = GeocodingService::new();
        let shipments = vec![shipment("FD-002", "Unknown hamlet", "Mumbai")];
        let waypoints = expand_waypoints(&shipments, &geocoder);

        assert!(waypoints[0].latitude.is_none());
        assert!(waypoints[1].latitude.is_some());
    }

    #[test]
    fn test_violations_name_every_offending_shipment() {
        let geocoder = GeocodingService::new();
        let s1 = shipment("FD-A", "Delhi", "Mumbai");
        let s2 = shipment("FD-B", "Jaipur", "Pune");
        let mut waypoints = expand_waypoints(&[s1, s2], &geocoder);

        // Invertir ambos pares pickup/drop
        waypoints.swap(0, 1);
        waypoints.swap(2, 3);

        let errors = collect_ordering_violations(&waypoints);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("FD-A")));
        assert!(errors.iter().any(|e| e.contains("FD-B")));
    }

    #[test]
    fn test_valid_order_has_no_violations() {
        let geocoder = GeocodingService::new();
        let waypoints = expand_waypoints(&[shipment("FD-C", "Delhi", "Mumbai")], &geocoder);
        assert!(collect_ordering_violations(&waypoints).is_empty());
    }

    #[test]
    fn test_metrics_count_and_distance() {
        let geocoder = GeocodingService::new();
        let waypoints = expand_waypoints(&[shipment("FD-D", "Delhi", "Mumbai")], &geocoder);
        let metrics = compute_metrics(&waypoints, DEFAULT_ORIGIN);

        assert_eq!(metrics.pickup_count, 1);
        assert_eq!(metrics.drop_count, 1);
        // Delhi → Mumbai aprox. 1150 km, unas 19 horas a 60 km/h
        assert!(metrics.total_distance_km > 1100.0 && metrics.total_distance_km < 1200.0);
        assert!(metrics.total_duration_mins > 1100.0);
    }

    #[test]
    fn test_apply_order_keeps_unresolved_at_end() {
        let geocoder = GeocodingService::new();
        let resolved = shipment("FD-E", "Delhi", "Mumbai");
        let unresolved = shipment("FD-F", "Nowhere", "Nowhere else");
        let waypoints = expand_waypoints(&[resolved.clone(), unresolved.clone()], &geocoder);

        let order = vec![
            waypoint_key(resolved.id, WaypointKind::Drop),
            waypoint_key(resolved.id, WaypointKind::Pickup),
        ];
        let ordered = apply_order(waypoints, &order);

        assert_eq!(ordered.len(), 4);
        assert_eq!(ordered[0].kind, WaypointKind::Drop);
        assert_eq!(ordered[2].shipment_id, unresolved.id);
        assert_eq!(ordered[3].shipment_id, unresolved.id);
    }
}
