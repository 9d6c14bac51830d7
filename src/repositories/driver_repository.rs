//! Repositorio de conductores
//!
//! La disponibilidad se deriva contando envíos in_transit y hojas de
//! ruta abiertas; nunca se almacena como flag.

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::driver_dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::models::driver::{Driver, DriverAvailability};
use crate::utils::errors::{map_unique_violation, AppResult};

pub struct DriverRepository {
    pool: PgPool,
}

impl DriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &CreateDriverRequest) -> AppResult<Driver> {
        let driver = sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (id, license_number, full_name, phone, active, user_id)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.license_number)
        .bind(&request.full_name)
        .bind(&request.phone)
        .bind(request.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, "driver", "license_number", request.license_number.clone())
        })?;

        Ok(driver)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(driver)
    }

    pub async fn find_all(&self) -> AppResult<Vec<Driver>> {
        let drivers = sqlx::query_as::<_, Driver>("SELECT * FROM drivers ORDER BY full_name")
            .fetch_all(&self.pool)
            .await?;
        Ok(drivers)
    }

    pub async fn update(&self, id: Uuid, request: &UpdateDriverRequest) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>(
            r#"
            UPDATE drivers
            SET license_number = COALESCE($2, license_number),
                full_name = COALESCE($3, full_name),
                phone = COALESCE($4, phone),
                active = COALESCE($5, active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.license_number)
        .bind(&request.full_name)
        .bind(&request.phone)
        .bind(request.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "driver",
                "license_number",
                request.license_number.clone().unwrap_or_default(),
            )
        })?;
        Ok(driver)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM drivers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Disponibilidad derivada: activo, sin envíos in_transit y sin
    /// hojas aprobadas en curso (aprobada y sin timestamp de fin).
    /// Una hoja en draft o submitted todavía no ocupa al conductor.
    pub async fn availability(&self, id: Uuid) -> AppResult<Option<DriverAvailability>> {
        let Some(driver) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let in_transit_shipments: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shipments WHERE driver_id = $1 AND status = 'in_transit'",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let open_trip_sheets: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM trip_sheets
            WHERE driver_id = $1 AND status = 'approved' AND ended_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(DriverAvailability::derive(
            id,
            driver.active,
            in_transit_shipments,
            open_trip_sheets,
        )))
    }

    /// ¿Tiene envíos u hojas vivos que impidan borrarlo?
    pub async fn has_live_references(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM shipments
                WHERE driver_id = $1 AND status IN ('planned', 'in_transit')
            ) OR EXISTS(
                SELECT 1 FROM trip_sheets
                WHERE driver_id = $1 AND status IN ('draft', 'submitted', 'approved')
            )
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
