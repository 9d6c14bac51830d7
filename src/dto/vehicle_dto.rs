//! DTOs de Vehicle

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::VehicleStatus;

/// Request para crear un nuevo vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 5, max = 20))]
    pub registration_number: String,

    pub capacity_kg: Option<Decimal>,
    pub primary_driver_id: Option<Uuid>,
    pub last_known_location: Option<String>,
    pub maintenance_cycle_km: Option<Decimal>,
    pub next_maintenance_at: Option<DateTime<Utc>>,
}

/// Request para actualizar un vehículo existente
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 5, max = 20))]
    pub registration_number: Option<String>,

    pub capacity_kg: Option<Decimal>,
    pub status: Option<VehicleStatus>,
    pub primary_driver_id: Option<Uuid>,
    pub last_known_location: Option<String>,
    pub maintenance_cycle_km: Option<Decimal>,
    pub last_maintenance_at: Option<DateTime<Utc>>,
    pub next_maintenance_at: Option<DateTime<Utc>>,
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Deserialize)]
pub struct VehicleFilters {
    pub status: Option<VehicleStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
