//! DTOs de Shipment

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::shipment::ShipmentStatus;

/// Request para crear un nuevo envío (siempre nace en draft)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShipmentRequest {
    /// Si no se envía, se genera una referencia SHP-...
    #[validate(custom = "crate::utils::validation::validate_reference_number")]
    pub reference_number: Option<String>,

    #[validate(length(min = 2, max = 200))]
    pub origin: String,

    #[validate(length(min = 2, max = 200))]
    pub destination: String,

    pub scheduled_pickup_at: Option<DateTime<Utc>>,
    pub scheduled_drop_at: Option<DateTime<Utc>>,

    pub weight_kg: Option<Decimal>,

    /// Precio en unidades menores
    #[validate(range(min = 0))]
    pub price_minor: Option<i64>,

    pub created_by: Option<Uuid>,
}

/// Request para actualizar campos no-lifecycle de un envío
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateShipmentRequest {
    #[validate(length(min = 2, max = 200))]
    pub origin: Option<String>,

    #[validate(length(min = 2, max = 200))]
    pub destination: Option<String>,

    pub scheduled_pickup_at: Option<DateTime<Utc>>,
    pub scheduled_drop_at: Option<DateTime<Utc>>,

    pub weight_kg: Option<Decimal>,

    #[validate(range(min = 0))]
    pub price_minor: Option<i64>,
}

/// Request para una transición de estado vía el orquestador
#[derive(Debug, Deserialize)]
pub struct UpdateShipmentStatusRequest {
    pub status: ShipmentStatus,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
}

/// Filtros para listado de envíos
#[derive(Debug, Deserialize)]
pub struct ShipmentFilters {
    pub status: Option<ShipmentStatus>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
