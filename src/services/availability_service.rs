//! Guard de disponibilidad de recursos
//!
//! Único punto por donde pasa cualquier cambio de estado de un envío.
//! Opera SIEMPRE dentro de la transacción abierta del llamador: bloquea
//! las filas de envío, conductor y vehículo con FOR UPDATE, valida la
//! adyacencia de estados y recuenta la exclusividad in_transit bajo el
//! lock. Cualquier violación aborta la transacción completa.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::driver::Driver;
use crate::models::shipment::{Shipment, ShipmentStatus};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::utils::errors::{AppError, AppResult};

use super::invoicing_service::InvoicingService;

pub struct AvailabilityGuard;

impl AvailabilityGuard {
    /// Intentar la transición de estado de un envío. Devuelve la fila
    /// actualizada o el error de dominio que el llamador debe propagar
    /// sin commitear.
    pub async fn try_transition(
        conn: &mut PgConnection,
        shipment_id: Uuid,
        target: ShipmentStatus,
        requested_driver: Option<Uuid>,
        requested_vehicle: Option<Uuid>,
    ) -> AppResult<Shipment> {
        let shipment = Self::lock_shipment(conn, shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment not found".to_string()))?;

        // Un envío entregado es inmutable; re-afirmar Delivered es no-op
        if shipment.status == ShipmentStatus::Delivered {
            if target == ShipmentStatus::Delivered {
                return Ok(shipment);
            }
            return Err(AppError::InvalidStatusTransition {
                from: shipment.status.to_string(),
                to: target.to_string(),
            });
        }

        if !shipment.status.can_transition_to(target) {
            return Err(AppError::InvalidStatusTransition {
                from: shipment.status.to_string(),
                to: target.to_string(),
            });
        }

        let final_driver = requested_driver.or(shipment.driver_id);
        let final_vehicle = requested_vehicle.or(shipment.vehicle_id);

        // Entrar o permanecer en in_transit exige ambos recursos libres
        if target == ShipmentStatus::InTransit {
            let driver_id = final_driver.ok_or(AppError::DriverRequired)?;
            let vehicle_id = final_vehicle.ok_or(AppError::VehicleRequired)?;

            let is_driver_reassignment =
                requested_driver.is_some() && shipment.driver_id != requested_driver;
            let is_vehicle_reassignment =
                requested_vehicle.is_some() && shipment.vehicle_id != requested_vehicle;

            Self::check_driver(conn, shipment.id, driver_id, is_driver_reassignment).await?;
            Self::check_vehicle(conn, shipment.id, vehicle_id, is_vehicle_reassignment).await?;
        }

        // Primer paso por in_transit / delivered estampa el timestamp real
        let actual_pickup_at = match (target, shipment.actual_pickup_at) {
            (ShipmentStatus::InTransit, None) => Some(Utc::now()),
            (_, existing) => existing,
        };
        let actual_drop_at = match (target, shipment.actual_drop_at) {
            (ShipmentStatus::Delivered, None) => Some(Utc::now()),
            (_, existing) => existing,
        };

        let updated = Self::persist(
            conn,
            shipment.id,
            target,
            final_driver,
            final_vehicle,
            actual_pickup_at,
            actual_drop_at,
        )
        .await?;

        if target == ShipmentStatus::Delivered {
            InvoicingService::ensure_invoice(conn, &updated).await?;
        }

        log::info!(
            "🔄 Envío {} pasó de {} a {}",
            updated.reference_number,
            shipment.status,
            updated.status
        );

        Ok(updated)
    }

    async fn lock_shipment(
        conn: &mut PgConnection,
        shipment_id: Uuid,
    ) -> AppResult<Option<Shipment>> {
        let shipment = sqlx::query_as::<_, Shipment>(
            "SELECT * FROM shipments WHERE id = $1 FOR UPDATE",
        )
        .bind(shipment_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(shipment)
    }

    /// Bloquear la fila del conductor y recontar sus envíos in_transit
    /// bajo el lock. El conteo excluye al propio envío.
    async fn check_driver(
        conn: &mut PgConnection,
        shipment_id: Uuid,
        driver_id: Uuid,
        is_reassignment: bool,
    ) -> AppResult<()> {
        let driver = sqlx::query_as::<_, Driver>(
            "SELECT * FROM drivers WHERE id = $1 FOR UPDATE",
        )
        .bind(driver_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

        if !driver.active {
            return Err(AppError::BadRequest(format!(
                "Driver {} is inactive",
                driver.full_name
            )));
        }

        let competing: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM shipments
            WHERE driver_id = $1 AND status = 'in_transit' AND id <> $2
            "#,
        )
        .bind(driver_id)
        .bind(shipment_id)
        .fetch_one(&mut *conn)
        .await?;

        if competing > 0 {
            return Err(if is_reassignment {
                AppError::TargetDriverBusy(driver_id)
            } else {
                AppError::DriverBusy(driver_id)
            });
        }
        Ok(())
    }

    /// Bloquear la fila del vehículo, rechazar mantenimiento y recontar
    /// sus envíos in_transit bajo el lock.
    async fn check_vehicle(
        conn: &mut PgConnection,
        shipment_id: Uuid,
        vehicle_id: Uuid,
        is_reassignment: bool,
    ) -> AppResult<()> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE id = $1 FOR UPDATE",
        )
        .bind(vehicle_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        if vehicle.status == VehicleStatus::Maintenance {
            return Err(AppError::VehicleMaintenance(vehicle_id));
        }

        let competing: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM shipments
            WHERE vehicle_id = $1 AND status = 'in_transit' AND id <> $2
            "#,
        )
        .bind(vehicle_id)
        .bind(shipment_id)
        .fetch_one(&mut *conn)
        .await?;

        if competing > 0 {
            return Err(if is_reassignment {
                AppError::TargetVehicleBusy(vehicle_id)
            } else {
                AppError::VehicleBusy(vehicle_id)
            });
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn persist(
        conn: &mut PgConnection,
        shipment_id: Uuid,
        status: ShipmentStatus,
        driver_id: Option<Uuid>,
        vehicle_id: Option<Uuid>,
        actual_pickup_at: Option<DateTime<Utc>>,
        actual_drop_at: Option<DateTime<Utc>>,
    ) -> AppResult<Shipment> {
        let updated = sqlx::query_as::<_, Shipment>(
            r#"
            UPDATE shipments
            SET status = $2,
                driver_id = $3,
                vehicle_id = $4,
                actual_pickup_at = $5,
                actual_drop_at = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(shipment_id)
        .bind(status)
        .bind(driver_id)
        .bind(vehicle_id)
        .bind(actual_pickup_at)
        .bind(actual_drop_at)
        .fetch_one(&mut *conn)
        .await?;
        Ok(updated)
    }
}
