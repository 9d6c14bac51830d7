//! Rutas de envíos

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::ShipmentController;
use crate::dto::common::ApiResponse;
use crate::dto::shipment_dto::{
    CreateShipmentRequest, ShipmentFilters, UpdateShipmentRequest, UpdateShipmentStatusRequest,
};
use crate::models::invoice::Invoice;
use crate::models::shipment::Shipment;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_shipment_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_shipment))
        .route("/", get(list_shipments))
        .route("/:id", get(get_shipment))
        .route("/:id", put(update_shipment))
        .route("/:id", delete(delete_shipment))
        .route("/:id/status", patch(update_shipment_status))
        .route("/:id/invoice", get(get_shipment_invoice))
}

async fn create_shipment(
    State(state): State<AppState>,
    Json(request): Json<CreateShipmentRequest>,
) -> Result<Json<ApiResponse<Shipment>>, AppError> {
    let controller = ShipmentController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn list_shipments(
    State(state): State<AppState>,
    Query(filters): Query<ShipmentFilters>,
) -> Result<Json<Vec<Shipment>>, AppError> {
    let controller = ShipmentController::new(state.pool.clone());
    let shipments = controller.list(filters).await?;
    Ok(Json(shipments))
}

async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Shipment>, AppError> {
    let controller = ShipmentController::new(state.pool.clone());
    let shipment = controller.get_by_id(id).await?;
    Ok(Json(shipment))
}

async fn update_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateShipmentRequest>,
) -> Result<Json<Shipment>, AppError> {
    let controller = ShipmentController::new(state.pool.clone());
    let shipment = controller.update(id, request).await?;
    Ok(Json(shipment))
}

async fn update_shipment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateShipmentStatusRequest>,
) -> Result<Json<ApiResponse<Shipment>>, AppError> {
    let controller = ShipmentController::new(state.pool.clone());
    let response = controller.update_status(id, request).await?;
    Ok(Json(response))
}

async fn delete_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = ShipmentController::new(state.pool.clone());
    let response = controller.delete(id).await?;
    Ok(Json(response))
}

async fn get_shipment_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    let controller = ShipmentController::new(state.pool.clone());
    let invoice = controller.get_invoice(id).await?;
    Ok(Json(invoice))
}
