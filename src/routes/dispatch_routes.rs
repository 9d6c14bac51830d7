//! Rutas del matcher de despacho

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::dispatch_dto::{
    AssignRequest, AutoAssignRequest, AutoAssignResponse, ShipmentSuggestions, SuggestRequest,
};
use crate::models::shipment::Shipment;
use crate::services::DispatchService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dispatch_router() -> Router<AppState> {
    Router::new()
        .route("/suggestions", post(suggest))
        .route("/assign", post(assign))
        .route("/auto-assign", post(auto_assign))
}

fn service(state: &AppState) -> DispatchService {
    DispatchService::new(state.pool.clone(), state.geocoder.clone(), state.ml.clone())
}

async fn suggest(
    State(state): State<AppState>,
    Json(request): Json<SuggestRequest>,
) -> Result<Json<Vec<ShipmentSuggestions>>, AppError> {
    request.validate()?;
    let suggestions = service(&state).suggest(&request).await?;
    Ok(Json(suggestions))
}

async fn assign(
    State(state): State<AppState>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<ApiResponse<Shipment>>, AppError> {
    let shipment = service(&state).assign(&request).await?;
    Ok(Json(ApiResponse::success_with_message(
        shipment,
        "Vehículo asignado exitosamente".to_string(),
    )))
}

async fn auto_assign(
    State(state): State<AppState>,
    Json(request): Json<AutoAssignRequest>,
) -> Result<Json<AutoAssignResponse>, AppError> {
    request.validate()?;
    let response = service(&state).auto_assign(&request).await?;
    Ok(Json(response))
}
