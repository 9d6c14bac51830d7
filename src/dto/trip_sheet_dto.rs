//! DTOs de TripSheet

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::trip_sheet::{FuelStop, TripExpense, TripSheet, TripSheetStatus};
use crate::models::shipment::Shipment;

/// Subtotales de gasto editables; lo no enviado conserva su valor
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ExpenseSubtotalsPatch {
    #[validate(range(min = 0))]
    pub fuel_expense_minor: Option<i64>,
    #[validate(range(min = 0))]
    pub toll_expense_minor: Option<i64>,
    #[validate(range(min = 0))]
    pub other_expense_minor: Option<i64>,
    #[validate(range(min = 0))]
    pub driver_allowance_minor: Option<i64>,
    #[validate(range(min = 0))]
    pub loading_unloading_minor: Option<i64>,
    #[validate(range(min = 0))]
    pub police_expense_minor: Option<i64>,
    #[validate(range(min = 0))]
    pub adblue_expense_minor: Option<i64>,
}

impl ExpenseSubtotalsPatch {
    pub fn is_empty(&self) -> bool {
        self.fuel_expense_minor.is_none()
            && self.toll_expense_minor.is_none()
            && self.other_expense_minor.is_none()
            && self.driver_allowance_minor.is_none()
            && self.loading_unloading_minor.is_none()
            && self.police_expense_minor.is_none()
            && self.adblue_expense_minor.is_none()
    }
}

/// Request para crear una hoja de ruta en borrador
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTripSheetRequest {
    /// Si no se envía, se genera un número TS-...
    pub sheet_number: Option<String>,

    pub driver_id: Uuid,
    /// Opcional: la hoja puede nacer sin vehículo y asignarse después
    pub vehicle_id: Option<Uuid>,

    /// Envíos a vincular, en orden de secuencia
    #[serde(default)]
    pub shipment_ids: Vec<Uuid>,

    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub start_odometer_km: Option<Decimal>,
    pub fuel_start_pct: Option<Decimal>,

    #[validate(range(min = 0))]
    pub driver_advance_minor: Option<i64>,

    pub started_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Request para editar una hoja en borrador
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTripSheetRequest {
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub start_odometer_km: Option<Decimal>,
    pub end_odometer_km: Option<Decimal>,
    pub fuel_start_pct: Option<Decimal>,
    pub fuel_end_pct: Option<Decimal>,

    #[validate]
    #[serde(default)]
    pub expenses: ExpenseSubtotalsPatch,

    #[validate(range(min = 0))]
    pub driver_advance_minor: Option<i64>,

    /// Si se envía, reemplaza el conjunto de envíos vinculados
    pub shipment_ids: Option<Vec<Uuid>>,

    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Request para una transición de estado de la hoja
#[derive(Debug, Deserialize)]
pub struct UpdateTripSheetStatusRequest {
    pub status: TripSheetStatus,
}

/// Request para agregar una parada de combustible (solo en draft)
#[derive(Debug, Deserialize, Validate)]
pub struct AddFuelStopRequest {
    #[validate(length(min = 2, max = 200))]
    pub location: String,

    pub liters: Decimal,

    #[validate(range(min = 0))]
    pub amount_minor: i64,

    pub odometer_km: Option<Decimal>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Request para agregar una línea de gasto (solo en draft)
#[derive(Debug, Deserialize, Validate)]
pub struct AddTripExpenseRequest {
    #[validate(length(min = 2, max = 50))]
    pub category: String,

    #[validate(range(min = 0))]
    pub amount_minor: i64,

    pub incurred_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Filtros para listado de hojas
#[derive(Debug, Deserialize)]
pub struct TripSheetFilters {
    pub status: Option<TripSheetStatus>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Hoja de ruta con sus envíos y registros embebidos
#[derive(Debug, Serialize)]
pub struct TripSheetDetail {
    #[serde(flatten)]
    pub sheet: TripSheet,
    pub shipments: Vec<Shipment>,
    pub fuel_stops: Vec<FuelStop>,
    pub expenses: Vec<TripExpense>,
}

/// Resultado del agrupador de envíos sin hoja
#[derive(Debug, Serialize)]
pub struct GroupingResult {
    pub created_sheets: Vec<TripSheet>,
    pub grouped_shipments: usize,
}
