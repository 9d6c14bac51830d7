//! Repositorio de vehículos

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleFilters};
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::utils::errors::{map_unique_violation, AppResult};

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &CreateVehicleRequest) -> AppResult<Vehicle> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, registration_number, capacity_kg, status,
                                  primary_driver_id, last_known_location,
                                  maintenance_cycle_km, next_maintenance_at)
            VALUES ($1, $2, $3, 'active', $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.registration_number)
        .bind(request.capacity_kg)
        .bind(request.primary_driver_id)
        .bind(&request.last_known_location)
        .bind(request.maintenance_cycle_km)
        .bind(request.next_maintenance_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "vehicle",
                "registration_number",
                request.registration_number.clone(),
            )
        })?;

        Ok(vehicle)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    pub async fn find_all(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::vehicle_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filters.status)
        .bind(filters.limit.unwrap_or(100))
        .bind(filters.offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    pub async fn find_by_status(&self, status: VehicleStatus) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE status = $1 ORDER BY registration_number",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }

    pub async fn update(&self, id: Uuid, request: &UpdateVehicleRequest) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET registration_number = COALESCE($2, registration_number),
                capacity_kg = COALESCE($3, capacity_kg),
                status = COALESCE($4, status),
                primary_driver_id = COALESCE($5, primary_driver_id),
                last_known_location = COALESCE($6, last_known_location),
                maintenance_cycle_km = COALESCE($7, maintenance_cycle_km),
                last_maintenance_at = COALESCE($8, last_maintenance_at),
                next_maintenance_at = COALESCE($9, next_maintenance_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.registration_number)
        .bind(request.capacity_kg)
        .bind(request.status)
        .bind(request.primary_driver_id)
        .bind(&request.last_known_location)
        .bind(request.maintenance_cycle_km)
        .bind(request.last_maintenance_at)
        .bind(request.next_maintenance_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "vehicle",
                "registration_number",
                request.registration_number.clone().unwrap_or_default(),
            )
        })?;
        Ok(vehicle)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// ¿Tiene envíos u hojas de ruta vivos que impidan borrarlo?
    pub async fn has_live_references(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM shipments
                WHERE vehicle_id = $1 AND status IN ('planned', 'in_transit')
            ) OR EXISTS(
                SELECT 1 FROM trip_sheets
                WHERE vehicle_id = $1 AND status IN ('draft', 'submitted', 'approved')
            )
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Vehículos con mantenimiento vencido a la fecha
    pub async fn find_maintenance_due(&self) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE next_maintenance_at IS NOT NULL AND next_maintenance_at <= $1
            ORDER BY next_maintenance_at
            "#,
        )
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;
        Ok(vehicles)
    }
}
