//! Rutas de conductores

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::DriverController;
use crate::dto::common::ApiResponse;
use crate::dto::driver_dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::models::driver::{Driver, DriverAvailability};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_driver))
        .route("/", get(list_drivers))
        .route("/:id", get(get_driver))
        .route("/:id", put(update_driver))
        .route("/:id", delete(delete_driver))
        .route("/:id/availability", get(driver_availability))
}

async fn create_driver(
    State(state): State<AppState>,
    Json(request): Json<CreateDriverRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn list_drivers(State(state): State<AppState>) -> Result<Json<Vec<Driver>>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    let drivers = controller.list().await?;
    Ok(Json(drivers))
}

async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    let driver = controller.get_by_id(id).await?;
    Ok(Json(driver))
}

async fn update_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    let driver = controller.update(id, request).await?;
    Ok(Json(driver))
}

async fn delete_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    let response = controller.delete(id).await?;
    Ok(Json(response))
}

async fn driver_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverAvailability>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    let availability = controller.availability(id).await?;
    Ok(Json(availability))
}
