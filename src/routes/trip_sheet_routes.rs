//! Rutas de hojas de ruta

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::TripSheetController;
use crate::dto::common::ApiResponse;
use crate::dto::trip_sheet_dto::{
    AddFuelStopRequest, AddTripExpenseRequest, CreateTripSheetRequest, GroupingResult,
    TripSheetDetail, TripSheetFilters, UpdateTripSheetRequest, UpdateTripSheetStatusRequest,
};
use crate::models::trip_sheet::{FuelStop, TripExpense, TripSheet};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_sheet_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_trip_sheet))
        .route("/", get(list_trip_sheets))
        .route("/group", post(group_unsheeted))
        .route("/:id", get(get_trip_sheet))
        .route("/:id", put(update_trip_sheet))
        .route("/:id", delete(delete_trip_sheet))
        .route("/:id/status", patch(update_trip_sheet_status))
        .route("/:id/settle", post(settle_trip_sheet))
        .route("/:id/fuel-stops", post(add_fuel_stop))
        .route("/:id/expenses", post(add_expense))
}

async fn create_trip_sheet(
    State(state): State<AppState>,
    Json(request): Json<CreateTripSheetRequest>,
) -> Result<Json<ApiResponse<TripSheetDetail>>, AppError> {
    let controller = TripSheetController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn list_trip_sheets(
    State(state): State<AppState>,
    Query(filters): Query<TripSheetFilters>,
) -> Result<Json<Vec<TripSheet>>, AppError> {
    let controller = TripSheetController::new(state.pool.clone());
    let sheets = controller.list(filters).await?;
    Ok(Json(sheets))
}

async fn get_trip_sheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripSheetDetail>, AppError> {
    let controller = TripSheetController::new(state.pool.clone());
    let detail = controller.get_by_id(id).await?;
    Ok(Json(detail))
}

async fn update_trip_sheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTripSheetRequest>,
) -> Result<Json<TripSheetDetail>, AppError> {
    let controller = TripSheetController::new(state.pool.clone());
    let detail = controller.update(id, request).await?;
    Ok(Json(detail))
}

async fn update_trip_sheet_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTripSheetStatusRequest>,
) -> Result<Json<ApiResponse<TripSheet>>, AppError> {
    let controller = TripSheetController::new(state.pool.clone());
    let response = controller.update_status(id, request).await?;
    Ok(Json(response))
}

async fn settle_trip_sheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripSheet>>, AppError> {
    let controller = TripSheetController::new(state.pool.clone());
    let response = controller.settle(id).await?;
    Ok(Json(response))
}

async fn delete_trip_sheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = TripSheetController::new(state.pool.clone());
    let response = controller.delete(id).await?;
    Ok(Json(response))
}

async fn add_fuel_stop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddFuelStopRequest>,
) -> Result<Json<FuelStop>, AppError> {
    let controller = TripSheetController::new(state.pool.clone());
    let stop = controller.add_fuel_stop(id, request).await?;
    Ok(Json(stop))
}

async fn add_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddTripExpenseRequest>,
) -> Result<Json<TripExpense>, AppError> {
    let controller = TripSheetController::new(state.pool.clone());
    let expense = controller.add_expense(id, request).await?;
    Ok(Json(expense))
}

async fn group_unsheeted(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GroupingResult>>, AppError> {
    let controller = TripSheetController::new(state.pool.clone());
    let response = controller.group_unsheeted().await?;
    Ok(Json(response))
}
