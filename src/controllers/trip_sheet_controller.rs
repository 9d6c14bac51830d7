//! Gestor del ciclo de vida de hojas de ruta
//!
//! Toda operación que toca una hoja junto con sus envíos corre en una
//! transacción: creación con vínculos, reedición del conjunto, cancelación
//! y liquidación. Las ediciones estructurales solo proceden en draft.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::trip_sheet_dto::{
    AddFuelStopRequest, AddTripExpenseRequest, CreateTripSheetRequest, GroupingResult,
    TripSheetDetail, TripSheetFilters, UpdateTripSheetRequest, UpdateTripSheetStatusRequest,
};
use crate::models::shipment::{Shipment, ShipmentStatus};
use crate::models::trip_sheet::{compute_settlement, FuelStop, TripExpense, TripSheet, TripSheetStatus};
use crate::repositories::{DriverRepository, ShipmentRepository, TripSheetRepository, VehicleRepository};
use crate::utils::errors::{AppError, AppResult};

pub struct TripSheetController {
    pool: PgPool,
    repository: TripSheetRepository,
    shipments: ShipmentRepository,
    drivers: DriverRepository,
    vehicles: VehicleRepository,
}

impl TripSheetController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: TripSheetRepository::new(pool.clone()),
            shipments: ShipmentRepository::new(pool.clone()),
            drivers: DriverRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            pool,
        }
    }

    /// Crear una hoja en borrador, opcionalmente vinculando envíos.
    /// Todo o nada: cualquier envío inválido aborta la creación.
    pub async fn create(
        &self,
        mut request: CreateTripSheetRequest,
    ) -> AppResult<ApiResponse<TripSheetDetail>> {
        request.validate()?;

        self.drivers
            .find_by_id(request.driver_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;
        if let Some(vehicle_id) = request.vehicle_id {
            self.vehicles
                .find_by_id(vehicle_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;
        }

        let mut txn = self.pool.begin().await?;

        let linked = if request.shipment_ids.is_empty() {
            Vec::new()
        } else {
            Self::lock_linkable(&mut *txn, &request.shipment_ids, None).await?
        };

        // Origen y destino por defecto: primer pickup y último drop
        if request.start_location.is_none() {
            request.start_location = linked.first().map(|s| s.origin.clone());
        }
        if request.end_location.is_none() {
            request.end_location = linked.last().map(|s| s.destination.clone());
        }

        let sheet = TripSheetRepository::create(&mut *txn, &request).await?;

        for (idx, shipment) in linked.iter().enumerate() {
            ShipmentRepository::link_to_trip_sheet(
                &mut *txn,
                shipment.id,
                sheet.id,
                idx as i32 + 1,
                sheet.driver_id,
                sheet.vehicle_id,
            )
            .await?;
        }

        let revenue = ShipmentRepository::revenue_for_trip_sheet(&mut *txn, sheet.id).await?;
        TripSheetRepository::set_total_revenue(&mut *txn, sheet.id, revenue).await?;

        txn.commit().await?;

        log::info!(
            "📋 Hoja {} creada con {} envíos vinculados",
            sheet.sheet_number,
            linked.len()
        );

        let detail = self.load_detail(sheet.id).await?;
        Ok(ApiResponse::success_with_message(
            detail,
            "Hoja de ruta creada exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<TripSheetDetail> {
        self.load_detail(id).await
    }

    pub async fn list(&self, filters: TripSheetFilters) -> AppResult<Vec<TripSheet>> {
        self.repository.find_all(&filters).await
    }

    /// Editar una hoja en borrador. Si el request trae shipment_ids se
    /// reemplaza el conjunto vinculado completo.
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateTripSheetRequest,
    ) -> AppResult<TripSheetDetail> {
        request.validate()?;

        let mut txn = self.pool.begin().await?;

        let sheet = TripSheetRepository::find_by_id_for_update(&mut *txn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip sheet not found".to_string()))?;

        if !sheet.status.is_editable() {
            return Err(AppError::TripSheetNotEditable(sheet.status.to_string()));
        }

        let sheet = TripSheetRepository::update_draft(&mut *txn, id, &request).await?;

        if let Some(shipment_ids) = &request.shipment_ids {
            ShipmentRepository::unlink_all_from_trip_sheet(&mut *txn, id).await?;

            // Los in_transit no se desvinculan: si sobrevive alguno el
            // conjunto no puede reemplazarse
            let remaining = ShipmentRepository::find_linked_references(&mut *txn, id).await?;
            if !remaining.is_empty() {
                return Err(AppError::InvalidShipmentStatus(remaining));
            }

            if !shipment_ids.is_empty() {
                let linked = Self::lock_linkable(&mut *txn, shipment_ids, Some(id)).await?;
                for (idx, shipment) in linked.iter().enumerate() {
                    ShipmentRepository::link_to_trip_sheet(
                        &mut *txn,
                        shipment.id,
                        id,
                        idx as i32 + 1,
                        sheet.driver_id,
                        sheet.vehicle_id,
                    )
                    .await?;
                }
            }

            let revenue = ShipmentRepository::revenue_for_trip_sheet(&mut *txn, id).await?;
            TripSheetRepository::set_total_revenue(&mut *txn, id, revenue).await?;
        }

        txn.commit().await?;

        self.load_detail(id).await
    }

    /// Transición de estado de la hoja. Liquidar delega en settle.
    pub async fn update_status(
        &self,
        id: Uuid,
        request: UpdateTripSheetStatusRequest,
    ) -> AppResult<ApiResponse<TripSheet>> {
        if request.status == TripSheetStatus::Settled {
            return self.settle(id).await;
        }

        // Validar y escribir sobre la fila bloqueada: una liquidación
        // concurrente no puede colarse entre la lectura y la escritura
        let mut txn = self.pool.begin().await?;

        let sheet = TripSheetRepository::find_by_id_for_update(&mut *txn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip sheet not found".to_string()))?;

        if sheet.status == request.status {
            return Ok(ApiResponse::success(sheet));
        }

        if !sheet.status.can_transition_to(request.status) {
            return Err(AppError::InvalidStatusTransition {
                from: sheet.status.to_string(),
                to: request.status.to_string(),
            });
        }

        // Cancelar libera los envíos vinculados de vuelta a draft
        if request.status == TripSheetStatus::Cancelled {
            let released = ShipmentRepository::unlink_all_from_trip_sheet(&mut *txn, id).await?;
            let updated =
                TripSheetRepository::update_status(&mut *txn, id, TripSheetStatus::Cancelled)
                    .await?;
            txn.commit().await?;

            log::info!(
                "🚫 Hoja {} cancelada, {} envíos liberados",
                updated.sheet_number,
                released
            );
            return Ok(ApiResponse::success_with_message(
                updated,
                "Hoja cancelada exitosamente".to_string(),
            ));
        }

        let updated = TripSheetRepository::update_status(&mut *txn, id, request.status).await?;
        txn.commit().await?;
        log::info!(
            "🔄 Hoja {} pasó de {} a {}",
            updated.sheet_number,
            sheet.status,
            updated.status
        );

        Ok(ApiResponse::success_with_message(
            updated,
            "Estado actualizado exitosamente".to_string(),
        ))
    }

    /// Liquidar la hoja: recalcula ingresos desde los envíos vinculados
    /// y escribe los tres derivados junto con el estado, atómicamente.
    pub async fn settle(&self, id: Uuid) -> AppResult<ApiResponse<TripSheet>> {
        let mut txn = self.pool.begin().await?;

        let sheet = TripSheetRepository::find_by_id_for_update(&mut *txn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip sheet not found".to_string()))?;

        if sheet.status == TripSheetStatus::Settled {
            return Err(AppError::TripSheetAlreadySettled);
        }
        if !sheet.status.can_transition_to(TripSheetStatus::Settled) {
            return Err(AppError::InvalidStatusTransition {
                from: sheet.status.to_string(),
                to: TripSheetStatus::Settled.to_string(),
            });
        }

        // Los ingresos nunca se toman del valor sembrado: se recalculan
        // de los precios vigentes al liquidar
        let revenue = ShipmentRepository::revenue_for_trip_sheet(&mut *txn, id).await?;
        let outcome = compute_settlement(sheet.driver_advance_minor, sheet.total_expense_minor, revenue);

        let settled = TripSheetRepository::settle(&mut *txn, id, &outcome).await?;
        txn.commit().await?;

        log::info!(
            "💰 Hoja {} liquidada: caja {}, utilidad {}",
            settled.sheet_number,
            settled.cash_balance_minor,
            settled.net_profit_minor
        );

        Ok(ApiResponse::success_with_message(
            settled,
            "Hoja liquidada exitosamente".to_string(),
        ))
    }

    /// Borrar una hoja; solo en draft o cancelled. Libera sus envíos.
    pub async fn delete(&self, id: Uuid) -> AppResult<ApiResponse<()>> {
        let sheet = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip sheet not found".to_string()))?;

        if !matches!(sheet.status, TripSheetStatus::Draft | TripSheetStatus::Cancelled) {
            return Err(AppError::DependencyViolation(format!(
                "Trip sheet {} is {} and cannot be deleted",
                sheet.sheet_number, sheet.status
            )));
        }

        let mut txn = self.pool.begin().await?;
        ShipmentRepository::unlink_all_from_trip_sheet(&mut *txn, id).await?;

        // Envíos in_transit adjuntos (vía el agrupador) sobreviven al
        // desvinculado y bloquean el borrado
        let remaining = ShipmentRepository::find_linked_references(&mut *txn, id).await?;
        if !remaining.is_empty() {
            return Err(AppError::DependencyViolation(format!(
                "Trip sheet {} still has shipments in transit: {}",
                sheet.sheet_number,
                remaining.join(", ")
            )));
        }

        sqlx::query("DELETE FROM trip_sheets WHERE id = $1")
            .bind(id)
            .execute(&mut *txn)
            .await?;
        txn.commit().await?;

        log::info!("🗑️ Hoja {} eliminada", sheet.sheet_number);
        Ok(ApiResponse {
            success: true,
            message: Some("Hoja eliminada exitosamente".to_string()),
            data: None,
        })
    }

    /// Agregar una parada de combustible (solo en draft)
    pub async fn add_fuel_stop(
        &self,
        id: Uuid,
        request: AddFuelStopRequest,
    ) -> AppResult<FuelStop> {
        request.validate()?;

        let mut txn = self.pool.begin().await?;

        let sheet = TripSheetRepository::find_by_id_for_update(&mut *txn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip sheet not found".to_string()))?;
        if !sheet.status.is_editable() {
            return Err(AppError::TripSheetNotEditable(sheet.status.to_string()));
        }

        let stop = TripSheetRepository::add_fuel_stop(&mut *txn, id, &request).await?;
        txn.commit().await?;

        Ok(stop)
    }

    /// Agregar una línea de gasto (solo en draft)
    pub async fn add_expense(
        &self,
        id: Uuid,
        request: AddTripExpenseRequest,
    ) -> AppResult<TripExpense> {
        request.validate()?;

        let mut txn = self.pool.begin().await?;

        let sheet = TripSheetRepository::find_by_id_for_update(&mut *txn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip sheet not found".to_string()))?;
        if !sheet.status.is_editable() {
            return Err(AppError::TripSheetNotEditable(sheet.status.to_string()));
        }

        let expense = TripSheetRepository::add_expense(&mut *txn, id, &request).await?;
        txn.commit().await?;

        Ok(expense)
    }

    /// Agrupar envíos asignados sin hoja por (conductor, vehículo) y
    /// crear una hoja en borrador por grupo.
    pub async fn group_unsheeted(&self) -> AppResult<ApiResponse<GroupingResult>> {
        let candidates = self.shipments.find_unsheeted_assigned().await?;
        if candidates.is_empty() {
            return Ok(ApiResponse::success(GroupingResult {
                created_sheets: Vec::new(),
                grouped_shipments: 0,
            }));
        }

        // Agrupar preservando el orden de llegada
        let mut groups: Vec<((Uuid, Uuid), Vec<Shipment>)> = Vec::new();
        for shipment in candidates {
            let key = match (shipment.driver_id, shipment.vehicle_id) {
                (Some(d), Some(v)) => (d, v),
                _ => continue,
            };
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(shipment),
                None => groups.push((key, vec![shipment])),
            }
        }

        let mut txn = self.pool.begin().await?;
        let mut created_sheets = Vec::with_capacity(groups.len());
        let mut grouped_shipments = 0usize;

        for ((driver_id, vehicle_id), members) in groups {
            let request = CreateTripSheetRequest {
                sheet_number: None,
                driver_id,
                vehicle_id: Some(vehicle_id),
                shipment_ids: Vec::new(),
                start_location: members.first().map(|s| s.origin.clone()),
                end_location: members.last().map(|s| s.destination.clone()),
                start_odometer_km: None,
                fuel_start_pct: None,
                driver_advance_minor: None,
                started_at: None,
                notes: None,
            };
            let sheet = TripSheetRepository::create(&mut *txn, &request).await?;

            for (idx, shipment) in members.iter().enumerate() {
                ShipmentRepository::attach_to_trip_sheet(
                    &mut *txn,
                    shipment.id,
                    sheet.id,
                    idx as i32 + 1,
                )
                .await?;
            }
            grouped_shipments += members.len();

            let revenue = ShipmentRepository::revenue_for_trip_sheet(&mut *txn, sheet.id).await?;
            TripSheetRepository::set_total_revenue(&mut *txn, sheet.id, revenue).await?;

            let seeded = TripSheetRepository::find_by_id_for_update(&mut *txn, sheet.id)
                .await?
                .ok_or_else(|| AppError::Internal("Trip sheet vanished mid-grouping".to_string()))?;
            created_sheets.push(seeded);
        }

        txn.commit().await?;

        log::info!(
            "🧮 Agrupador: {} hojas creadas para {} envíos",
            created_sheets.len(),
            grouped_shipments
        );

        Ok(ApiResponse::success_with_message(
            GroupingResult {
                created_sheets,
                grouped_shipments,
            },
            "Envíos agrupados exitosamente".to_string(),
        ))
    }

    /// Bloquear y validar el conjunto de envíos a vincular: todos deben
    /// existir, estar en draft y no pertenecer a otra hoja.
    async fn lock_linkable(
        conn: &mut PgConnection,
        ids: &[Uuid],
        current_sheet: Option<Uuid>,
    ) -> AppResult<Vec<Shipment>> {
        let found = ShipmentRepository::find_by_ids_for_update(conn, ids).await?;

        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.iter().any(|s| s.id == **id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::ShipmentsNotFound(missing));
        }

        let not_draft: Vec<String> = found
            .iter()
            .filter(|s| s.status != ShipmentStatus::Draft)
            .map(|s| s.reference_number.clone())
            .collect();
        if !not_draft.is_empty() {
            return Err(AppError::InvalidShipmentStatus(not_draft));
        }

        let already_linked: Vec<String> = found
            .iter()
            .filter(|s| s.trip_sheet_id.is_some() && s.trip_sheet_id != current_sheet)
            .map(|s| s.reference_number.clone())
            .collect();
        if !already_linked.is_empty() {
            return Err(AppError::ShipmentsAlreadyLinked(already_linked));
        }

        // Respetar el orden pedido: la posición en la lista es la secuencia
        let mut ordered = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(shipment) = found.iter().find(|s| s.id == *id) {
                ordered.push(shipment.clone());
            }
        }
        Ok(ordered)
    }

    async fn load_detail(&self, id: Uuid) -> AppResult<TripSheetDetail> {
        let sheet = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip sheet not found".to_string()))?;

        let shipments = self.shipments.find_by_trip_sheet(id).await?;
        let fuel_stops = self.repository.list_fuel_stops(id).await?;
        let expenses = self.repository.list_expenses(id).await?;

        Ok(TripSheetDetail {
            sheet,
            shipments,
            fuel_stops,
            expenses,
        })
    }
}
