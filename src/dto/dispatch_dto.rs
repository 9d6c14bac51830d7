//! DTOs del matcher de despacho

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request de sugerencias de asignación
#[derive(Debug, Deserialize, Validate)]
pub struct SuggestRequest {
    #[validate(length(min = 1))]
    pub shipment_ids: Vec<Uuid>,

    /// Descarta candidatos por encima de esta distancia (km)
    pub max_distance_km: Option<f64>,

    /// Descarta candidatos por debajo de este score de capacidad
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_capacity_match: Option<f64>,
}

/// Un vehículo candidato con su score desglosado
#[derive(Debug, Clone, Serialize)]
pub struct VehicleCandidate {
    pub vehicle_id: Uuid,
    pub registration_number: String,
    pub score: f64,
    pub capacity_match: f64,
    pub proximity_score: f64,
    pub availability_score: f64,
    pub distance_km: Option<f64>,
}

/// Candidatos rankeados para un envío
#[derive(Debug, Serialize)]
pub struct ShipmentSuggestions {
    pub shipment_id: Uuid,
    pub reference_number: String,
    pub candidates: Vec<VehicleCandidate>,
}

/// Request de asignación directa
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub shipment_id: Uuid,
    pub vehicle_id: Uuid,
}

/// Request de auto-asignación por lote
#[derive(Debug, Deserialize, Validate)]
pub struct AutoAssignRequest {
    #[validate(length(min = 1))]
    pub shipment_ids: Vec<Uuid>,
}

/// Resultado del lote: cuántos se asignaron y cuáles fallaron
#[derive(Debug, Serialize)]
pub struct AutoAssignResponse {
    pub assigned: usize,
    pub failed: Vec<Uuid>,
}
