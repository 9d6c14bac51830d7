//! Orquestador de envíos
//!
//! CRUD de envíos y el punto de entrada de las transiciones de estado:
//! abre la transacción, invoca el guard de disponibilidad y commitea.
//! Los códigos de conflicto del guard se propagan sin tocar.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::shipment_dto::{
    CreateShipmentRequest, ShipmentFilters, UpdateShipmentRequest, UpdateShipmentStatusRequest,
};
use crate::models::invoice::Invoice;
use crate::models::shipment::{Shipment, ShipmentStatus};
use crate::repositories::ShipmentRepository;
use crate::services::availability_service::AvailabilityGuard;
use crate::services::invoicing_service::InvoicingService;
use crate::utils::errors::{AppError, AppResult};

pub struct ShipmentController {
    pool: PgPool,
    repository: ShipmentRepository,
}

impl ShipmentController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ShipmentRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn create(&self, request: CreateShipmentRequest) -> AppResult<ApiResponse<Shipment>> {
        request.validate()?;

        let shipment = self.repository.create(&request).await?;
        log::info!("📦 Envío {} creado en draft", shipment.reference_number);

        Ok(ApiResponse::success_with_message(
            shipment,
            "Envío creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Shipment> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment not found".to_string()))
    }

    pub async fn list(&self, filters: ShipmentFilters) -> AppResult<Vec<Shipment>> {
        self.repository.find_all(&filters).await
    }

    /// Actualizar campos no-lifecycle. Los cambios de estado van SIEMPRE
    /// por update_status.
    pub async fn update(&self, id: Uuid, request: UpdateShipmentRequest) -> AppResult<Shipment> {
        request.validate()?;

        let existing = self.get_by_id(id).await?;
        if !existing.status.allows_field_edits() {
            return Err(AppError::Conflict(format!(
                "Shipment {} is {} and cannot be edited",
                existing.reference_number, existing.status
            )));
        }

        self.repository
            .update(id, &request)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment not found".to_string()))
    }

    /// Transición de estado atómica a través del guard
    pub async fn update_status(
        &self,
        id: Uuid,
        request: UpdateShipmentStatusRequest,
    ) -> AppResult<ApiResponse<Shipment>> {
        let mut txn = self.pool.begin().await?;

        let shipment = AvailabilityGuard::try_transition(
            &mut *txn,
            id,
            request.status,
            request.driver_id,
            request.vehicle_id,
        )
        .await?;

        txn.commit().await?;

        Ok(ApiResponse::success_with_message(
            shipment,
            "Estado actualizado exitosamente".to_string(),
        ))
    }

    /// Borrar un envío. Bloqueado para envíos en tránsito o entregados,
    /// para los vinculados a una hoja de ruta y para los ya facturados.
    pub async fn delete(&self, id: Uuid) -> AppResult<ApiResponse<()>> {
        let shipment = self.get_by_id(id).await?;

        if matches!(
            shipment.status,
            ShipmentStatus::InTransit | ShipmentStatus::Delivered
        ) {
            return Err(AppError::DependencyViolation(format!(
                "Shipment {} is {} and cannot be deleted",
                shipment.reference_number, shipment.status
            )));
        }

        if shipment.trip_sheet_id.is_some() {
            return Err(AppError::DependencyViolation(format!(
                "Shipment {} is linked to a trip sheet",
                shipment.reference_number
            )));
        }

        if self.repository.has_invoice(id).await? {
            return Err(AppError::DependencyViolation(format!(
                "Shipment {} has an invoice issued",
                shipment.reference_number
            )));
        }

        self.repository.delete(id).await?;
        log::info!("🗑️ Envío {} eliminado", shipment.reference_number);

        Ok(ApiResponse {
            success: true,
            message: Some("Envío eliminado exitosamente".to_string()),
            data: None,
        })
    }

    /// Factura del envío, si ya fue emitida
    pub async fn get_invoice(&self, id: Uuid) -> AppResult<Invoice> {
        // Verifica primero que el envío exista para distinguir 404s
        self.get_by_id(id).await?;

        InvoicingService::get_for_shipment(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice not issued yet".to_string()))
    }
}
