//! DTOs del secuenciador de rutas

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request de optimización de ruta
#[derive(Debug, Deserialize, Validate)]
pub struct OptimizeRouteRequest {
    pub vehicle_id: Uuid,

    #[validate(length(min = 1))]
    pub shipment_ids: Vec<Uuid>,
}

/// Tipo de parada derivada de un envío
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WaypointKind {
    Pickup,
    Drop,
}

/// Una parada de la secuencia
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteWaypoint {
    pub shipment_id: Uuid,
    pub reference_number: String,
    pub kind: WaypointKind,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub sequence: usize,
    pub eta: Option<DateTime<Utc>>,
}

/// Métricas acumuladas de la secuencia
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub total_distance_km: f64,
    pub total_duration_mins: f64,
    pub pickup_count: usize,
    pub drop_count: usize,
}

/// Plan de ruta completo con validación pickup-antes-de-drop
#[derive(Debug, Serialize, Deserialize)]
pub struct RoutePlanResponse {
    pub vehicle_id: Uuid,
    pub waypoints: Vec<RouteWaypoint>,
    pub metrics: RouteMetrics,
    pub is_valid: bool,
    pub errors: Vec<String>,
    /// true cuando la secuencia vino del optimizador remoto
    pub optimized_remotely: bool,
}
