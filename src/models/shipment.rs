//! Modelo de Shipment
//!
//! Este módulo contiene el struct Shipment, su máquina de estados y la
//! tabla de transiciones permitidas. Mapea exactamente al schema
//! PostgreSQL con primary key 'id'.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use uuid::Uuid;

use super::money::Money;

/// Estado del envío - mapea al ENUM shipment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "shipment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Draft,
    Planned,
    InTransit,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Draft => "draft",
            ShipmentStatus::Planned => "planned",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }

    /// Tabla de adyacencia de la máquina de estados.
    /// El mismo estado siempre es un no-op válido.
    pub fn can_transition_to(&self, target: ShipmentStatus) -> bool {
        if *self == target {
            return true;
        }
        matches!(
            (*self, target),
            (ShipmentStatus::Draft, ShipmentStatus::Planned)
                | (ShipmentStatus::Draft, ShipmentStatus::InTransit)
                | (ShipmentStatus::Draft, ShipmentStatus::Cancelled)
                | (ShipmentStatus::Planned, ShipmentStatus::InTransit)
                | (ShipmentStatus::Planned, ShipmentStatus::Draft)
                | (ShipmentStatus::Planned, ShipmentStatus::Cancelled)
                | (ShipmentStatus::InTransit, ShipmentStatus::Delivered)
                | (ShipmentStatus::InTransit, ShipmentStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }

    /// Los campos de negocio (origen, peso, precio...) solo se editan
    /// mientras el envío está vivo; entregado o cancelado queda inmutable.
    pub fn allows_field_edits(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipment principal - mapea exactamente a la tabla shipments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shipment {
    pub id: Uuid,
    pub reference_number: String,
    pub status: ShipmentStatus,
    pub origin: String,
    pub destination: String,
    pub scheduled_pickup_at: Option<DateTime<Utc>>,
    pub scheduled_drop_at: Option<DateTime<Utc>>,
    pub actual_pickup_at: Option<DateTime<Utc>>,
    pub actual_drop_at: Option<DateTime<Utc>>,
    pub weight_kg: Option<Decimal>,
    pub price_minor: Money,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub trip_sheet_id: Option<Uuid>,
    pub trip_sequence: Option<i32>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        use ShipmentStatus::*;
        assert!(Draft.can_transition_to(Planned));
        assert!(Draft.can_transition_to(InTransit));
        assert!(Planned.can_transition_to(InTransit));
        assert!(Planned.can_transition_to(Draft));
        assert!(InTransit.can_transition_to(Delivered));
        assert!(InTransit.can_transition_to(Cancelled));
    }

    #[test]
    fn test_rejected_transitions() {
        use ShipmentStatus::*;
        assert!(!Delivered.can_transition_to(InTransit));
        assert!(!Delivered.can_transition_to(Draft));
        assert!(!Cancelled.can_transition_to(Planned));
        assert!(!Draft.can_transition_to(Delivered));
        assert!(!InTransit.can_transition_to(Planned));
    }

    #[test]
    fn test_same_status_is_noop() {
        use ShipmentStatus::*;
        for status in [Draft, Planned, InTransit, Delivered, Cancelled] {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn test_terminal_shipments_reject_field_edits() {
        use ShipmentStatus::*;
        assert!(Draft.allows_field_edits());
        assert!(Planned.allows_field_edits());
        assert!(InTransit.allows_field_edits());
        assert!(!Delivered.allows_field_edits());
        assert!(!Cancelled.allows_field_edits());
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&ShipmentStatus::InTransit).unwrap();
        assert_eq!(json, "\"in_transit\"");
    }
}
