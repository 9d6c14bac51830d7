//! Modelo de Driver
//!
//! La disponibilidad de un conductor es SIEMPRE derivada de los envíos
//! y hojas de ruta vivas, nunca un flag almacenado.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Driver principal - mapea exactamente a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub license_number: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub active: bool,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Disponibilidad derivada de un conductor. open_trip_sheets cuenta
/// solo hojas aprobadas sin timestamp de fin: las hojas en draft o
/// submitted todavía no ocupan al conductor.
#[derive(Debug, Serialize)]
pub struct DriverAvailability {
    pub driver_id: Uuid,
    pub active: bool,
    pub in_transit_shipments: i64,
    pub open_trip_sheets: i64,
    pub available: bool,
}

impl DriverAvailability {
    pub fn derive(
        driver_id: Uuid,
        active: bool,
        in_transit_shipments: i64,
        open_trip_sheets: i64,
    ) -> Self {
        Self {
            driver_id,
            active,
            in_transit_shipments,
            open_trip_sheets,
            available: active && in_transit_shipments == 0 && open_trip_sheets == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_requires_active_and_free() {
        let id = Uuid::new_v4();

        assert!(DriverAvailability::derive(id, true, 0, 0).available);
        assert!(!DriverAvailability::derive(id, false, 0, 0).available);
        assert!(!DriverAvailability::derive(id, true, 1, 0).available);
        // una hoja aprobada en curso lo ocupa
        assert!(!DriverAvailability::derive(id, true, 0, 1).available);
    }
}
