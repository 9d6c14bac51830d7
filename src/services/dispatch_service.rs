//! Matcher de despacho: sugerencia y asignación de vehículos
//!
//! El score combina capacidad, proximidad y disponibilidad con pesos
//! fijos. Las funciones de scoring son puras y deterministas; el hook
//! de ML solo multiplica el score final y degrada a 1.0 ante fallos.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::dispatch_dto::{
    AssignRequest, AutoAssignRequest, AutoAssignResponse, ShipmentSuggestions, SuggestRequest,
    VehicleCandidate,
};
use crate::models::shipment::{Shipment, ShipmentStatus};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::repositories::{ShipmentRepository, VehicleRepository};
use crate::utils::errors::{AppError, AppResult};

use super::geocoding_service::GeocodingService;
use super::ml_client::MlClient;

/// Pesos fijos del score compuesto
const W_CAPACITY: f64 = 0.4;
const W_PROXIMITY: f64 = 0.4;
const W_AVAILABILITY: f64 = 0.2;

/// Score de disponibilidad de un vehículo elegible (los no elegibles
/// se excluyen antes de puntuar)
const AVAILABILITY_ELIGIBLE: f64 = 1.0;

/// Score neutro cuando falta información para puntuar
const NEUTRAL_SCORE: f64 = 0.5;

/// Utilización objetivo: un envío que llena el 80% del vehículo
/// puntúa capacidad perfecta
const TARGET_UTILIZATION: f64 = 0.8;

/// Distancia a partir de la cual la proximidad puntúa cero (km)
const PROXIMITY_RANGE_KM: f64 = 100.0;

/// Umbral de capacidad usado por la auto-asignación
const AUTO_ASSIGN_MIN_CAPACITY: f64 = 0.5;

/// Máximo de candidatos devueltos por envío
const MAX_CANDIDATES: usize = 3;

/// Score de capacidad: 0 si el envío no cabe, lineal hasta la
/// utilización objetivo, neutro si falta el peso o la capacidad.
pub fn capacity_match_score(weight_kg: Option<Decimal>, capacity_kg: Option<Decimal>) -> f64 {
    let (Some(weight), Some(capacity)) = (weight_kg, capacity_kg) else {
        return NEUTRAL_SCORE;
    };
    let (Some(weight), Some(capacity)) = (weight.to_f64(), capacity.to_f64()) else {
        return NEUTRAL_SCORE;
    };
    if capacity <= 0.0 {
        return NEUTRAL_SCORE;
    }

    let ratio = weight / capacity;
    if ratio > 1.0 {
        return 0.0;
    }
    (ratio / TARGET_UTILIZATION).min(1.0)
}

/// Score de proximidad: lineal decreciente hasta PROXIMITY_RANGE_KM,
/// neutro si la distancia no se pudo resolver.
pub fn proximity_score(distance_km: Option<f64>) -> f64 {
    match distance_km {
        Some(d) => (1.0 - d / PROXIMITY_RANGE_KM).max(0.0),
        None => NEUTRAL_SCORE,
    }
}

/// Score compuesto con los pesos fijos
pub fn composite_score(capacity: f64, proximity: f64, availability: f64) -> f64 {
    W_CAPACITY * capacity + W_PROXIMITY * proximity + W_AVAILABILITY * availability
}

/// Componentes del score de un candidato que pasó todos los filtros
#[derive(Debug, PartialEq)]
pub struct CandidateScore {
    pub capacity_match: f64,
    pub proximity_score: f64,
    pub score: f64,
}

/// Evaluar un vehículo contra un envío aplicando los filtros de
/// distancia y capacidad mínima; None significa excluido del ranking.
pub fn evaluate_candidate(
    weight_kg: Option<Decimal>,
    capacity_kg: Option<Decimal>,
    distance_km: Option<f64>,
    max_distance_km: Option<f64>,
    min_capacity_match: Option<f64>,
) -> Option<CandidateScore> {
    if let (Some(max), Some(d)) = (max_distance_km, distance_km) {
        if d > max {
            return None;
        }
    }

    let capacity_match = capacity_match_score(weight_kg, capacity_kg);
    if let Some(min) = min_capacity_match {
        if capacity_match < min {
            return None;
        }
    }

    let proximity = proximity_score(distance_km);
    Some(CandidateScore {
        capacity_match,
        proximity_score: proximity,
        score: composite_score(capacity_match, proximity, AVAILABILITY_ELIGIBLE),
    })
}

pub struct DispatchService {
    shipments: ShipmentRepository,
    vehicles: VehicleRepository,
    geocoder: GeocodingService,
    ml: MlClient,
}

impl DispatchService {
    pub fn new(pool: PgPool, geocoder: GeocodingService, ml: MlClient) -> Self {
        Self {
            shipments: ShipmentRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool),
            geocoder,
            ml,
        }
    }

    /// Sugerir vehículos rankeados para un lote de envíos
    pub async fn suggest(&self, request: &SuggestRequest) -> AppResult<Vec<ShipmentSuggestions>> {
        let shipments = self.load_assignable_shipments(&request.shipment_ids).await?;
        let fleet = self.vehicles.find_by_status(VehicleStatus::Active).await?;

        log::info!(
            "🎯 Calculando sugerencias: {} envíos contra {} vehículos activos",
            shipments.len(),
            fleet.len()
        );

        let mut suggestions = Vec::with_capacity(shipments.len());
        for shipment in &shipments {
            let candidates = self
                .rank_candidates(
                    shipment,
                    &fleet,
                    request.max_distance_km,
                    request.min_capacity_match,
                )
                .await;

            suggestions.push(ShipmentSuggestions {
                shipment_id: shipment.id,
                reference_number: shipment.reference_number.clone(),
                candidates,
            });
        }

        Ok(suggestions)
    }

    /// Asignar directamente un vehículo a un envío (status pasa a Planned)
    pub async fn assign(&self, request: &AssignRequest) -> AppResult<Shipment> {
        let shipment = self
            .shipments
            .find_by_id(request.shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment not found".to_string()))?;

        if !matches!(shipment.status, ShipmentStatus::Draft | ShipmentStatus::Planned) {
            return Err(AppError::BadRequest(format!(
                "Shipment {} is {} and cannot be assigned",
                shipment.reference_number, shipment.status
            )));
        }

        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if vehicle.status != VehicleStatus::Active {
            return Err(AppError::BadRequest(format!(
                "Vehicle {} is not active",
                vehicle.registration_number
            )));
        }

        let updated = self
            .shipments
            .set_vehicle_and_status(shipment.id, vehicle.id, ShipmentStatus::Planned)
            .await?;

        log::info!(
            "✅ Envío {} asignado al vehículo {}",
            updated.reference_number,
            vehicle.registration_number
        );

        Ok(updated)
    }

    /// Auto-asignar cada envío a su mejor candidato. Un fallo individual
    /// nunca aborta el lote.
    pub async fn auto_assign(&self, request: &AutoAssignRequest) -> AppResult<AutoAssignResponse> {
        let suggest_request = SuggestRequest {
            shipment_ids: request.shipment_ids.clone(),
            max_distance_km: None,
            min_capacity_match: Some(AUTO_ASSIGN_MIN_CAPACITY),
        };
        let suggestions = self.suggest(&suggest_request).await?;

        let mut assigned = 0usize;
        let mut failed: Vec<Uuid> = Vec::new();

        // Envíos que no produjeron sugerencia (no elegibles o inexistentes)
        // cuentan como fallidos
        for id in &request.shipment_ids {
            if !suggestions.iter().any(|s| s.shipment_id == *id) {
                failed.push(*id);
            }
        }

        for suggestion in suggestions {
            let Some(top) = suggestion.candidates.first() else {
                log::warn!(
                    "⚠️ Sin candidatos para el envío {}, queda sin asignar",
                    suggestion.reference_number
                );
                failed.push(suggestion.shipment_id);
                continue;
            };

            let assign = AssignRequest {
                shipment_id: suggestion.shipment_id,
                vehicle_id: top.vehicle_id,
            };
            match self.assign(&assign).await {
                Ok(_) => assigned += 1,
                Err(e) => {
                    log::warn!(
                        "⚠️ Auto-asignación falló para {}: {}",
                        suggestion.shipment_id,
                        e
                    );
                    failed.push(suggestion.shipment_id);
                }
            }
        }

        Ok(AutoAssignResponse { assigned, failed })
    }

    async fn load_assignable_shipments(&self, ids: &[Uuid]) -> AppResult<Vec<Shipment>> {
        let shipments = self.shipments.find_by_ids(ids).await?;

        let assignable: Vec<Shipment> = shipments
            .into_iter()
            .filter(|s| {
                matches!(s.status, ShipmentStatus::Draft | ShipmentStatus::Planned)
                    && s.vehicle_id.is_none()
            })
            .collect();

        Ok(assignable)
    }

    async fn rank_candidates(
        &self,
        shipment: &Shipment,
        fleet: &[Vehicle],
        max_distance_km: Option<f64>,
        min_capacity_match: Option<f64>,
    ) -> Vec<VehicleCandidate> {
        let mut candidates: Vec<VehicleCandidate> = Vec::new();

        for vehicle in fleet {
            let distance_km = vehicle
                .last_known_location
                .as_deref()
                .and_then(|loc| self.geocoder.address_distance_km(loc, &shipment.origin));

            let Some(evaluated) = evaluate_candidate(
                shipment.weight_kg,
                vehicle.capacity_kg,
                distance_km,
                max_distance_km,
                min_capacity_match,
            ) else {
                continue;
            };

            // Hook de ML best-effort sobre el conductor principal
            let mut score = evaluated.score;
            if let Some(driver_id) = vehicle.primary_driver_id {
                score *= self.ml.driver_score_multiplier(driver_id).await;
            }

            candidates.push(VehicleCandidate {
                vehicle_id: vehicle.id,
                registration_number: vehicle.registration_number.clone(),
                score,
                capacity_match: evaluated.capacity_match,
                proximity_score: evaluated.proximity_score,
                availability_score: AVAILABILITY_ELIGIBLE,
                distance_km,
            });
        }

        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(MAX_CANDIDATES);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_capacity_at_target_utilization_is_perfect() {
        // 800 kg en un vehículo de 1000 kg: ratio 0.8 → 1.0
        let score = capacity_match_score(Some(dec!(800)), Some(dec!(1000)));
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_capacity_half_of_target() {
        // ratio 0.4 → 0.5
        let score = capacity_match_score(Some(dec!(400)), Some(dec!(1000)));
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_capacity_overweight_is_zero() {
        // ratio 1.2 → 0.0
        let score = capacity_match_score(Some(dec!(1200)), Some(dec!(1000)));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_capacity_missing_data_is_neutral() {
        assert_eq!(capacity_match_score(None, Some(dec!(1000))), NEUTRAL_SCORE);
        assert_eq!(capacity_match_score(Some(dec!(500)), None), NEUTRAL_SCORE);
        assert_eq!(capacity_match_score(None, None), NEUTRAL_SCORE);
    }

    #[test]
    fn test_proximity_decreases_linearly() {
        assert!((proximity_score(Some(0.0)) - 1.0).abs() < 1e-9);
        assert!((proximity_score(Some(50.0)) - 0.5).abs() < 1e-9);
        assert_eq!(proximity_score(Some(150.0)), 0.0);
        assert_eq!(proximity_score(None), NEUTRAL_SCORE);
    }

    #[test]
    fn test_candidate_filters_exclude_not_penalize() {
        // Filtro de distancia: fuera de rango queda excluido
        let out_of_range =
            evaluate_candidate(Some(dec!(500)), Some(dec!(1000)), Some(120.0), Some(100.0), None);
        assert!(out_of_range.is_none());

        // Sin filtro, el mismo vehículo puntúa (proximidad en cero)
        let scored =
            evaluate_candidate(Some(dec!(500)), Some(dec!(1000)), Some(120.0), None, None);
        assert!(scored.is_some());
    }

    #[test]
    fn test_min_capacity_threshold_splits_a_batch() {
        // Tres envíos contra la misma flota de capacidad 1000 kg bajo el
        // umbral de auto-asignación: dos son elegibles, el sobrepeso no.
        let capacity = Some(dec!(1000));
        let min = Some(AUTO_ASSIGN_MIN_CAPACITY);

        let fits = evaluate_candidate(Some(dec!(500)), capacity, None, None, min);
        let tight = evaluate_candidate(Some(dec!(700)), capacity, None, None, min);
        let overweight = evaluate_candidate(Some(dec!(1500)), capacity, None, None, min);

        assert!(fits.is_some());
        assert!(tight.is_some());
        // Sin candidato: este envío termina en failed y no aborta el lote
        assert!(overweight.is_none());
    }

    #[test]
    fn test_composite_score_weights() {
        // Capacidad y proximidad perfectas: 0.4 + 0.4 + 0.2 = 1.0
        let score = composite_score(1.0, 1.0, 1.0);
        assert!((score - 1.0).abs() < 1e-9);

        // Solo disponibilidad: 0.2
        let score = composite_score(0.0, 0.0, 1.0);
        assert!((score - 0.2).abs() < 1e-9);
    }
}
