//! Modelo de TripSheet
//!
//! Este módulo contiene la hoja de ruta (trip sheet), su máquina de
//! estados, las siete categorías de gasto y la aritmética de liquidación.
//! Los montos van siempre en unidades menores.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;

use super::money::Money;

/// Estado de la hoja de ruta - mapea al ENUM trip_sheet_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "trip_sheet_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TripSheetStatus {
    Draft,
    Submitted,
    Approved,
    Cancelled,
    Settled,
}

impl TripSheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripSheetStatus::Draft => "draft",
            TripSheetStatus::Submitted => "submitted",
            TripSheetStatus::Approved => "approved",
            TripSheetStatus::Cancelled => "cancelled",
            TripSheetStatus::Settled => "settled",
        }
    }

    /// Transiciones dirigidas sin aristas de retroceso.
    /// Settled es inalcanzable desde Cancelled.
    pub fn can_transition_to(&self, target: TripSheetStatus) -> bool {
        if *self == target {
            return true;
        }
        matches!(
            (*self, target),
            (TripSheetStatus::Draft, TripSheetStatus::Submitted)
                | (TripSheetStatus::Draft, TripSheetStatus::Cancelled)
                | (TripSheetStatus::Draft, TripSheetStatus::Settled)
                | (TripSheetStatus::Submitted, TripSheetStatus::Approved)
                | (TripSheetStatus::Submitted, TripSheetStatus::Cancelled)
                | (TripSheetStatus::Submitted, TripSheetStatus::Settled)
                | (TripSheetStatus::Approved, TripSheetStatus::Settled)
        )
    }

    /// Solo las hojas en borrador aceptan ediciones estructurales
    pub fn is_editable(&self) -> bool {
        matches!(self, TripSheetStatus::Draft)
    }
}

impl fmt::Display for TripSheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Las siete categorías de gasto con subtotal propio en la hoja
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseCategory {
    Fuel,
    Toll,
    Other,
    DriverAllowance,
    LoadingUnloading,
    Police,
    Adblue,
}

impl ExpenseCategory {
    /// Mapear una etiqueta libre a su categoría; lo desconocido cae en Other
    pub fn from_label(label: &str) -> ExpenseCategory {
        match label.trim().to_lowercase().as_str() {
            "fuel" | "diesel" | "petrol" => ExpenseCategory::Fuel,
            "toll" | "fastag" => ExpenseCategory::Toll,
            "driver_allowance" | "allowance" | "bata" => ExpenseCategory::DriverAllowance,
            "loading_unloading" | "loading" | "unloading" | "hamali" => {
                ExpenseCategory::LoadingUnloading
            }
            "police" => ExpenseCategory::Police,
            "adblue" => ExpenseCategory::Adblue,
            _ => ExpenseCategory::Other,
        }
    }

    /// Columna de subtotal que alimenta esta categoría
    pub fn subtotal_column(&self) -> &'static str {
        match self {
            ExpenseCategory::Fuel => "fuel_expense_minor",
            ExpenseCategory::Toll => "toll_expense_minor",
            ExpenseCategory::Other => "other_expense_minor",
            ExpenseCategory::DriverAllowance => "driver_allowance_minor",
            ExpenseCategory::LoadingUnloading => "loading_unloading_minor",
            ExpenseCategory::Police => "police_expense_minor",
            ExpenseCategory::Adblue => "adblue_expense_minor",
        }
    }
}

/// TripSheet principal - mapea exactamente a la tabla trip_sheets
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripSheet {
    pub id: Uuid,
    pub sheet_number: String,
    pub status: TripSheetStatus,
    pub driver_id: Uuid,
    /// Puede faltar: una hoja sin vehículo asignado no es secuenciable
    pub vehicle_id: Option<Uuid>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub start_odometer_km: Option<Decimal>,
    pub end_odometer_km: Option<Decimal>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub fuel_start_pct: Option<Decimal>,
    pub fuel_end_pct: Option<Decimal>,
    pub fuel_expense_minor: Money,
    pub toll_expense_minor: Money,
    pub other_expense_minor: Money,
    pub driver_allowance_minor: Money,
    pub loading_unloading_minor: Money,
    pub police_expense_minor: Money,
    pub adblue_expense_minor: Money,
    pub total_expense_minor: Money,
    pub driver_advance_minor: Money,
    pub total_revenue_minor: Money,
    pub cash_balance_minor: Money,
    pub net_profit_minor: Money,
    pub settled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripSheet {
    /// Suma de los siete subtotales de gasto
    pub fn expense_total(&self) -> Money {
        self.fuel_expense_minor
            + self.toll_expense_minor
            + self.other_expense_minor
            + self.driver_allowance_minor
            + self.loading_unloading_minor
            + self.police_expense_minor
            + self.adblue_expense_minor
    }
}

/// Parada de combustible embebida en una hoja de ruta
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FuelStop {
    pub id: Uuid,
    pub trip_sheet_id: Uuid,
    pub location: String,
    pub liters: Decimal,
    pub amount_minor: Money,
    pub odometer_km: Option<Decimal>,
    pub stopped_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Línea de gasto embebida en una hoja de ruta
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripExpense {
    pub id: Uuid,
    pub trip_sheet_id: Uuid,
    pub category: String,
    pub amount_minor: Money,
    pub incurred_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Resultado de la liquidación de una hoja
#[derive(Debug, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub cash_balance: Money,
    pub total_revenue: Money,
    pub net_profit: Money,
}

/// Aritmética de liquidación.
///
/// cash_balance = anticipo − gastos (flujo de caja del conductor);
/// net_profit = ingresos − gastos (el anticipo NO entra al P&L).
/// Los ingresos se recalculan al liquidar, nunca se confía en el
/// valor sembrado al crear la hoja.
pub fn compute_settlement(advance: Money, total_expense: Money, revenue: Money) -> SettlementOutcome {
    SettlementOutcome {
        cash_balance: advance - total_expense,
        total_revenue: revenue,
        net_profit: revenue - total_expense,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_arithmetic() {
        let outcome = compute_settlement(Money(10_000), Money(6_500), Money(20_000));
        assert_eq!(outcome.cash_balance, Money(3_500));
        assert_eq!(outcome.net_profit, Money(13_500));
        assert_eq!(outcome.total_revenue, Money(20_000));
    }

    #[test]
    fn test_settlement_can_go_negative() {
        let outcome = compute_settlement(Money(1_000), Money(5_000), Money(2_000));
        assert_eq!(outcome.cash_balance, Money(-4_000));
        assert_eq!(outcome.net_profit, Money(-3_000));
    }

    #[test]
    fn test_trip_sheet_transitions() {
        use TripSheetStatus::*;
        assert!(Draft.can_transition_to(Submitted));
        assert!(Draft.can_transition_to(Settled));
        assert!(Submitted.can_transition_to(Approved));
        assert!(Submitted.can_transition_to(Settled));
        assert!(Approved.can_transition_to(Settled));

        assert!(!Approved.can_transition_to(Draft));
        assert!(!Cancelled.can_transition_to(Settled));
        assert!(!Settled.can_transition_to(Draft));
        assert!(!Approved.can_transition_to(Cancelled));

        // Settled es terminal: ninguna arista de salida
        assert!(!Settled.can_transition_to(Submitted));
        assert!(!Settled.can_transition_to(Approved));
        assert!(!Settled.can_transition_to(Cancelled));

        // mismo estado = no-op válido
        assert!(Settled.can_transition_to(Settled));
    }

    #[test]
    fn test_only_draft_is_editable() {
        use TripSheetStatus::*;
        assert!(Draft.is_editable());
        for status in [Submitted, Approved, Cancelled, Settled] {
            assert!(!status.is_editable());
        }
    }

    #[test]
    fn test_expense_category_labels() {
        assert_eq!(ExpenseCategory::from_label("Fuel"), ExpenseCategory::Fuel);
        assert_eq!(ExpenseCategory::from_label("FASTAG"), ExpenseCategory::Toll);
        assert_eq!(ExpenseCategory::from_label("bata"), ExpenseCategory::DriverAllowance);
        assert_eq!(ExpenseCategory::from_label("parking"), ExpenseCategory::Other);
    }
}
