//! Rutas del secuenciador

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::routing_dto::{OptimizeRouteRequest, RoutePlanResponse};
use crate::services::RoutingService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_routing_router() -> Router<AppState> {
    Router::new()
        .route("/optimize", post(optimize_route))
        .route("/trip-sheet/:id/suggest", get(suggest_for_trip_sheet))
}

fn service(state: &AppState) -> RoutingService {
    RoutingService::new(
        state.pool.clone(),
        state.geocoder.clone(),
        state.optimizer.clone(),
        state.route_cache.clone(),
    )
}

async fn optimize_route(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRouteRequest>,
) -> Result<Json<RoutePlanResponse>, AppError> {
    request.validate()?;
    let plan = service(&state)
        .sequence(request.vehicle_id, &request.shipment_ids)
        .await?;
    Ok(Json(plan))
}

async fn suggest_for_trip_sheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoutePlanResponse>, AppError> {
    let plan = service(&state).suggest_for_trip_sheet(id).await?;
    Ok(Json(plan))
}
