//! Controlador del registro de conductores

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::driver_dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::models::driver::{Driver, DriverAvailability};
use crate::repositories::DriverRepository;
use crate::utils::errors::{AppError, AppResult};

pub struct DriverController {
    repository: DriverRepository,
}

impl DriverController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DriverRepository::new(pool),
        }
    }

    pub async fn create(&self, request: CreateDriverRequest) -> AppResult<ApiResponse<Driver>> {
        request.validate()?;

        let driver = self.repository.create(&request).await?;
        log::info!("🧑‍✈️ Conductor {} registrado", driver.full_name);

        Ok(ApiResponse::success_with_message(
            driver,
            "Conductor creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Driver> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<Driver>> {
        self.repository.find_all().await
    }

    pub async fn update(&self, id: Uuid, request: UpdateDriverRequest) -> AppResult<Driver> {
        request.validate()?;

        self.repository
            .update(id, &request)
            .await?
            .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<ApiResponse<()>> {
        let driver = self.get_by_id(id).await?;

        if self.repository.has_live_references(id).await? {
            return Err(AppError::DependencyViolation(format!(
                "Driver {} has active shipments or open trip sheets",
                driver.full_name
            )));
        }

        self.repository.delete(id).await?;
        log::info!("🗑️ Conductor {} eliminado", driver.full_name);

        Ok(ApiResponse {
            success: true,
            message: Some("Conductor eliminado exitosamente".to_string()),
            data: None,
        })
    }

    /// Disponibilidad derivada del conductor
    pub async fn availability(&self, id: Uuid) -> AppResult<DriverAvailability> {
        self.repository
            .availability(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))
    }
}
