//! Controlador del registro de vehículos

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleFilters};
use crate::models::vehicle::Vehicle;
use crate::repositories::VehicleRepository;
use crate::services::ml_client::MlClient;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::validate_registration_number;

pub struct VehicleController {
    repository: VehicleRepository,
}

/// Vehículo con la nota de riesgo del servicio de ML (best-effort)
#[derive(Debug, serde::Serialize)]
pub struct MaintenanceDueEntry {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub risk_note: Option<String>,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool),
        }
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> AppResult<ApiResponse<Vehicle>> {
        request.validate()?;
        validate_registration_number(&request.registration_number)
            .map_err(|_| AppError::BadRequest("Invalid registration number format".to_string()))?;

        let vehicle = self.repository.create(&request).await?;
        log::info!("🚚 Vehículo {} registrado", vehicle.registration_number);

        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Vehicle> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))
    }

    pub async fn list(&self, filters: VehicleFilters) -> AppResult<Vec<Vehicle>> {
        self.repository.find_all(&filters).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateVehicleRequest) -> AppResult<Vehicle> {
        request.validate()?;
        if let Some(registration) = &request.registration_number {
            validate_registration_number(registration)
                .map_err(|_| AppError::BadRequest("Invalid registration number format".to_string()))?;
        }

        self.repository
            .update(id, &request)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))
    }

    /// Borrar un vehículo; bloqueado mientras tenga envíos u hojas vivos
    pub async fn delete(&self, id: Uuid) -> AppResult<ApiResponse<()>> {
        let vehicle = self.get_by_id(id).await?;

        if self.repository.has_live_references(id).await? {
            return Err(AppError::DependencyViolation(format!(
                "Vehicle {} has active shipments or open trip sheets",
                vehicle.registration_number
            )));
        }

        self.repository.delete(id).await?;
        log::info!("🗑️ Vehículo {} eliminado", vehicle.registration_number);

        Ok(ApiResponse {
            success: true,
            message: Some("Vehículo eliminado exitosamente".to_string()),
            data: None,
        })
    }

    /// Vehículos con mantenimiento vencido, anotados best-effort por ML
    pub async fn maintenance_due(&self, ml: &MlClient) -> AppResult<Vec<MaintenanceDueEntry>> {
        let vehicles = self.repository.find_maintenance_due().await?;

        let mut entries = Vec::with_capacity(vehicles.len());
        for vehicle in vehicles {
            let risk_note = ml.maintenance_risk_note(vehicle.id).await;
            entries.push(MaintenanceDueEntry { vehicle, risk_note });
        }
        Ok(entries)
    }
}
