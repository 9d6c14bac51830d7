//! Repositorio de hojas de ruta
//!
//! El total de gastos NUNCA se escribe suelto: toda sentencia que toca
//! un subtotal recalcula total_expense_minor como la suma de las siete
//! columnas en la misma sentencia.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::trip_sheet_dto::{
    AddFuelStopRequest, AddTripExpenseRequest, CreateTripSheetRequest, TripSheetFilters,
    UpdateTripSheetRequest,
};
use crate::models::money::Money;
use crate::models::trip_sheet::{
    ExpenseCategory, FuelStop, SettlementOutcome, TripExpense, TripSheet, TripSheetStatus,
};
use crate::utils::errors::{map_unique_violation, AppResult};

pub struct TripSheetRepository {
    pool: PgPool,
}

impl TripSheetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Crear la hoja en borrador, dentro de la transacción del llamador
    pub async fn create(
        conn: &mut PgConnection,
        request: &CreateTripSheetRequest,
    ) -> AppResult<TripSheet> {
        let sheet_number = request
            .sheet_number
            .clone()
            .unwrap_or_else(generate_sheet_number);

        let sheet = sqlx::query_as::<_, TripSheet>(
            r#"
            INSERT INTO trip_sheets (id, sheet_number, status, driver_id, vehicle_id,
                                     start_location, end_location, start_odometer_km,
                                     fuel_start_pct, driver_advance_minor, started_at, notes)
            VALUES ($1, $2, 'draft', $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&sheet_number)
        .bind(request.driver_id)
        .bind(request.vehicle_id)
        .bind(&request.start_location)
        .bind(&request.end_location)
        .bind(request.start_odometer_km)
        .bind(request.fuel_start_pct)
        .bind(Money(request.driver_advance_minor.unwrap_or(0)))
        .bind(request.started_at)
        .bind(&request.notes)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| map_unique_violation(e, "trip sheet", "sheet_number", sheet_number))?;

        Ok(sheet)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<TripSheet>> {
        let sheet = sqlx::query_as::<_, TripSheet>("SELECT * FROM trip_sheets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sheet)
    }

    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> AppResult<Option<TripSheet>> {
        let sheet = sqlx::query_as::<_, TripSheet>(
            "SELECT * FROM trip_sheets WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(sheet)
    }

    pub async fn find_all(&self, filters: &TripSheetFilters) -> AppResult<Vec<TripSheet>> {
        let sheets = sqlx::query_as::<_, TripSheet>(
            r#"
            SELECT * FROM trip_sheets
            WHERE ($1::trip_sheet_status IS NULL OR status = $1)
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
        Ok(sheets)
    }

    /// Editar una hoja en borrador. Los subtotales no enviados conservan
    /// su valor; el total se recalcula siempre en la misma sentencia.
    pub async fn update_draft(
        conn: &mut PgConnection,
        id: Uuid,
        request: &UpdateTripSheetRequest,
    ) -> AppResult<TripSheet> {
        let e = &request.expenses;
        let sheet = sqlx::query_as::<_, TripSheet>(
            r#"
            UPDATE trip_sheets
            SET start_location = COALESCE($2, start_location),
                end_location = COALESCE($3, end_location),
                start_odometer_km = COALESCE($4, start_odometer_km),
                end_odometer_km = COALESCE($5, end_odometer_km),
                fuel_start_pct = COALESCE($6, fuel_start_pct),
                fuel_end_pct = COALESCE($7, fuel_end_pct),
                fuel_expense_minor = COALESCE($8, fuel_expense_minor),
                toll_expense_minor = COALESCE($9, toll_expense_minor),
                other_expense_minor = COALESCE($10, other_expense_minor),
                driver_allowance_minor = COALESCE($11, driver_allowance_minor),
                loading_unloading_minor = COALESCE($12, loading_unloading_minor),
                police_expense_minor = COALESCE($13, police_expense_minor),
                adblue_expense_minor = COALESCE($14, adblue_expense_minor),
                total_expense_minor = COALESCE($8, fuel_expense_minor)
                    + COALESCE($9, toll_expense_minor)
                    + COALESCE($10, other_expense_minor)
                    + COALESCE($11, driver_allowance_minor)
                    + COALESCE($12, loading_unloading_minor)
                    + COALESCE($13, police_expense_minor)
                    + COALESCE($14, adblue_expense_minor),
                driver_advance_minor = COALESCE($15, driver_advance_minor),
                started_at = COALESCE($16, started_at),
                ended_at = COALESCE($17, ended_at),
                notes = COALESCE($18, notes),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.start_location)
        .bind(&request.end_location)
        .bind(request.start_odometer_km)
        .bind(request.end_odometer_km)
        .bind(request.fuel_start_pct)
        .bind(request.fuel_end_pct)
        .bind(e.fuel_expense_minor.map(Money))
        .bind(e.toll_expense_minor.map(Money))
        .bind(e.other_expense_minor.map(Money))
        .bind(e.driver_allowance_minor.map(Money))
        .bind(e.loading_unloading_minor.map(Money))
        .bind(e.police_expense_minor.map(Money))
        .bind(e.adblue_expense_minor.map(Money))
        .bind(request.driver_advance_minor.map(Money))
        .bind(request.started_at)
        .bind(request.ended_at)
        .bind(&request.notes)
        .fetch_one(&mut *conn)
        .await?;

        Ok(sheet)
    }

    /// Escribir el nuevo estado; el llamador ya validó la transición
    /// sobre una fila bloqueada en la misma transacción.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: TripSheetStatus,
    ) -> AppResult<TripSheet> {
        let sheet = sqlx::query_as::<_, TripSheet>(
            "UPDATE trip_sheets SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(&mut *conn)
        .await?;
        Ok(sheet)
    }

    /// Liquidar la hoja dentro de la transacción del llamador
    pub async fn settle(
        conn: &mut PgConnection,
        id: Uuid,
        outcome: &SettlementOutcome,
    ) -> AppResult<TripSheet> {
        let sheet = sqlx::query_as::<_, TripSheet>(
            r#"
            UPDATE trip_sheets
            SET status = 'settled',
                total_revenue_minor = $2,
                cash_balance_minor = $3,
                net_profit_minor = $4,
                settled_at = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(outcome.total_revenue)
        .bind(outcome.cash_balance)
        .bind(outcome.net_profit)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;
        Ok(sheet)
    }

    /// Sembrar los ingresos de la hoja con los precios de sus envíos
    pub async fn set_total_revenue(
        conn: &mut PgConnection,
        id: Uuid,
        revenue: Money,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE trip_sheets SET total_revenue_minor = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(revenue)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM trip_sheets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insertar una parada de combustible y sumar su monto al subtotal
    /// de combustible (y al total) en la misma transacción.
    pub async fn add_fuel_stop(
        conn: &mut PgConnection,
        trip_sheet_id: Uuid,
        request: &AddFuelStopRequest,
    ) -> AppResult<FuelStop> {
        let stop = sqlx::query_as::<_, FuelStop>(
            r#"
            INSERT INTO trip_fuel_stops (id, trip_sheet_id, location, liters, amount_minor,
                                         odometer_km, stopped_at, notes)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, now()), $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(trip_sheet_id)
        .bind(&request.location)
        .bind(request.liters)
        .bind(Money(request.amount_minor))
        .bind(request.odometer_km)
        .bind(request.stopped_at)
        .bind(&request.notes)
        .fetch_one(&mut *conn)
        .await?;

        Self::bump_subtotal(conn, trip_sheet_id, ExpenseCategory::Fuel, Money(request.amount_minor))
            .await?;

        Ok(stop)
    }

    /// Insertar una línea de gasto y sumar su monto al subtotal de su
    /// categoría (lo desconocido cae en other).
    pub async fn add_expense(
        conn: &mut PgConnection,
        trip_sheet_id: Uuid,
        request: &AddTripExpenseRequest,
    ) -> AppResult<TripExpense> {
        let expense = sqlx::query_as::<_, TripExpense>(
            r#"
            INSERT INTO trip_expenses (id, trip_sheet_id, category, amount_minor, incurred_at, notes)
            VALUES ($1, $2, $3, $4, COALESCE($5, now()), $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(trip_sheet_id)
        .bind(&request.category)
        .bind(Money(request.amount_minor))
        .bind(request.incurred_at)
        .bind(&request.notes)
        .fetch_one(&mut *conn)
        .await?;

        let category = ExpenseCategory::from_label(&request.category);
        Self::bump_subtotal(conn, trip_sheet_id, category, Money(request.amount_minor)).await?;

        Ok(expense)
    }

    pub async fn list_fuel_stops(&self, trip_sheet_id: Uuid) -> AppResult<Vec<FuelStop>> {
        let stops = sqlx::query_as::<_, FuelStop>(
            "SELECT * FROM trip_fuel_stops WHERE trip_sheet_id = $1 ORDER BY stopped_at",
        )
        .bind(trip_sheet_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stops)
    }

    pub async fn list_expenses(&self, trip_sheet_id: Uuid) -> AppResult<Vec<TripExpense>> {
        let expenses = sqlx::query_as::<_, TripExpense>(
            "SELECT * FROM trip_expenses WHERE trip_sheet_id = $1 ORDER BY incurred_at",
        )
        .bind(trip_sheet_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    /// Sumar un monto a la columna de subtotal de la categoría y
    /// recalcular el total. El nombre de columna sale del enum, nunca
    /// de entrada del usuario.
    async fn bump_subtotal(
        conn: &mut PgConnection,
        trip_sheet_id: Uuid,
        category: ExpenseCategory,
        amount: Money,
    ) -> AppResult<()> {
        let column = category.subtotal_column();
        let sql = format!(
            r#"
            UPDATE trip_sheets
            SET {column} = {column} + $2,
                total_expense_minor = fuel_expense_minor + toll_expense_minor
                    + other_expense_minor + driver_allowance_minor
                    + loading_unloading_minor + police_expense_minor
                    + adblue_expense_minor + $2,
                updated_at = now()
            WHERE id = $1
            "#
        );
        sqlx::query(&sql)
            .bind(trip_sheet_id)
            .bind(amount)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

/// Generar un número de hoja tipo TS-1A2B3C4D
fn generate_sheet_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("TS-{}", id[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_sheet_number_shape() {
        let number = generate_sheet_number();
        assert!(number.starts_with("TS-"));
        assert_eq!(number.len(), 11);
    }
}
