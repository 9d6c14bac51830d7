//! Repositorio de envíos
//!
//! CRUD sobre la tabla shipments más las consultas de exclusividad que
//! usa el guard. Las variantes que reciben &mut PgConnection están
//! pensadas para correr dentro de la transacción del llamador.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::shipment_dto::{CreateShipmentRequest, ShipmentFilters, UpdateShipmentRequest};
use crate::models::money::Money;
use crate::models::shipment::{Shipment, ShipmentStatus};
use crate::utils::errors::{map_unique_violation, AppResult};

pub struct ShipmentRepository {
    pool: PgPool,
}

impl ShipmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Crear un envío; siempre nace en draft
    pub async fn create(&self, request: &CreateShipmentRequest) -> AppResult<Shipment> {
        let reference = request
            .reference_number
            .clone()
            .unwrap_or_else(generate_reference);

        let shipment = sqlx::query_as::<_, Shipment>(
            r#"
            INSERT INTO shipments (id, reference_number, status, origin, destination,
                                   scheduled_pickup_at, scheduled_drop_at, weight_kg,
                                   price_minor, created_by)
            VALUES ($1, $2, 'draft', $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&reference)
        .bind(&request.origin)
        .bind(&request.destination)
        .bind(request.scheduled_pickup_at)
        .bind(request.scheduled_drop_at)
        .bind(request.weight_kg)
        .bind(Money(request.price_minor.unwrap_or(0)))
        .bind(request.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "shipment", "reference_number", reference))?;

        Ok(shipment)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Shipment>> {
        let shipment = sqlx::query_as::<_, Shipment>("SELECT * FROM shipments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(shipment)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Shipment>> {
        let shipments = sqlx::query_as::<_, Shipment>(
            "SELECT * FROM shipments WHERE id = ANY($1) ORDER BY created_at",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(shipments)
    }

    pub async fn find_all(&self, filters: &ShipmentFilters) -> AppResult<Vec<Shipment>> {
        let shipments = sqlx::query_as::<_, Shipment>(
            r#"
            SELECT * FROM shipments
            WHERE ($1::shipment_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR driver_id = $2)
              AND ($3::uuid IS NULL OR vehicle_id = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filters.status)
        .bind(filters.driver_id)
        .bind(filters.vehicle_id)
        .bind(filters.limit.unwrap_or(100))
        .bind(filters.offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(shipments)
    }

    /// Actualizar los campos no-lifecycle; lo no enviado conserva su valor
    pub async fn update(&self, id: Uuid, request: &UpdateShipmentRequest) -> AppResult<Option<Shipment>> {
        let shipment = sqlx::query_as::<_, Shipment>(
            r#"
            UPDATE shipments
            SET origin = COALESCE($2, origin),
                destination = COALESCE($3, destination),
                scheduled_pickup_at = COALESCE($4, scheduled_pickup_at),
                scheduled_drop_at = COALESCE($5, scheduled_drop_at),
                weight_kg = COALESCE($6, weight_kg),
                price_minor = COALESCE($7, price_minor),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.origin)
        .bind(&request.destination)
        .bind(request.scheduled_pickup_at)
        .bind(request.scheduled_drop_at)
        .bind(request.weight_kg)
        .bind(request.price_minor.map(Money))
        .fetch_optional(&self.pool)
        .await?;
        Ok(shipment)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM shipments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Asignación directa de vehículo desde el matcher
    pub async fn set_vehicle_and_status(
        &self,
        id: Uuid,
        vehicle_id: Uuid,
        status: ShipmentStatus,
    ) -> AppResult<Shipment> {
        let shipment = sqlx::query_as::<_, Shipment>(
            r#"
            UPDATE shipments
            SET vehicle_id = $2, status = $3, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(vehicle_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(shipment)
    }

    /// Envíos vinculados a una hoja, en orden de secuencia
    pub async fn find_by_trip_sheet(&self, trip_sheet_id: Uuid) -> AppResult<Vec<Shipment>> {
        let shipments = sqlx::query_as::<_, Shipment>(
            "SELECT * FROM shipments WHERE trip_sheet_id = $1 ORDER BY trip_sequence",
        )
        .bind(trip_sheet_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(shipments)
    }

    /// Vincular un envío a una hoja (dentro de la transacción del llamador).
    /// El envío pasa a planned y hereda conductor y vehículo de la hoja.
    pub async fn link_to_trip_sheet(
        conn: &mut PgConnection,
        shipment_id: Uuid,
        trip_sheet_id: Uuid,
        sequence: i32,
        driver_id: Uuid,
        vehicle_id: Option<Uuid>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE shipments
            SET trip_sheet_id = $2, trip_sequence = $3, status = 'planned',
                driver_id = $4, vehicle_id = $5, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(shipment_id)
        .bind(trip_sheet_id)
        .bind(sequence)
        .bind(driver_id)
        .bind(vehicle_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Vincular sin tocar estado ni asignación; lo usa el agrupador
    /// sobre envíos que ya van planned/in_transit con sus recursos.
    pub async fn attach_to_trip_sheet(
        conn: &mut PgConnection,
        shipment_id: Uuid,
        trip_sheet_id: Uuid,
        sequence: i32,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE shipments
            SET trip_sheet_id = $2, trip_sequence = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(shipment_id)
        .bind(trip_sheet_id)
        .bind(sequence)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Desvincular todos los envíos de una hoja; vuelven a draft
    pub async fn unlink_all_from_trip_sheet(
        conn: &mut PgConnection,
        trip_sheet_id: Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE shipments
            SET trip_sheet_id = NULL, trip_sequence = NULL, status = 'draft',
                updated_at = now()
            WHERE trip_sheet_id = $1 AND status = 'planned'
            "#,
        )
        .bind(trip_sheet_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Referencias de envíos que siguen vinculados a la hoja; el
    /// desvinculado masivo no toca los in_transit, así que puede quedar
    /// residuo que bloquea borrar la hoja o reemplazar su conjunto.
    pub async fn find_linked_references(
        conn: &mut PgConnection,
        trip_sheet_id: Uuid,
    ) -> AppResult<Vec<String>> {
        let refs: Vec<String> = sqlx::query_scalar(
            "SELECT reference_number FROM shipments WHERE trip_sheet_id = $1 ORDER BY trip_sequence",
        )
        .bind(trip_sheet_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(refs)
    }

    /// Bloquear las filas de un conjunto de envíos dentro de la transacción
    pub async fn find_by_ids_for_update(
        conn: &mut PgConnection,
        ids: &[Uuid],
    ) -> AppResult<Vec<Shipment>> {
        let shipments = sqlx::query_as::<_, Shipment>(
            "SELECT * FROM shipments WHERE id = ANY($1) ORDER BY created_at FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;
        Ok(shipments)
    }

    /// Ingresos agregados de los envíos de una hoja
    pub async fn revenue_for_trip_sheet(
        conn: &mut PgConnection,
        trip_sheet_id: Uuid,
    ) -> AppResult<Money> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(price_minor), 0) FROM shipments WHERE trip_sheet_id = $1",
        )
        .bind(trip_sheet_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(Money(total))
    }

    /// Envíos asignados (conductor y vehículo) que aún no pertenecen a
    /// ninguna hoja de ruta; insumo del agrupador.
    pub async fn find_unsheeted_assigned(&self) -> AppResult<Vec<Shipment>> {
        let shipments = sqlx::query_as::<_, Shipment>(
            r#"
            SELECT * FROM shipments
            WHERE trip_sheet_id IS NULL
              AND status IN ('planned', 'in_transit')
              AND driver_id IS NOT NULL
              AND vehicle_id IS NOT NULL
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(shipments)
    }

    /// ¿El envío está referenciado por registros que impiden borrarlo?
    pub async fn has_invoice(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM invoices WHERE shipment_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

/// Generar una referencia corta tipo SHP-1A2B3C4D
fn generate_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("SHP-{}", id[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_reference_shape() {
        let reference = generate_reference();
        assert!(reference.starts_with("SHP-"));
        assert_eq!(reference.len(), 12);
        assert!(reference[4..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
