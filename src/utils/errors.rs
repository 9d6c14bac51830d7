//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas. Los conflictos de
//! dominio llevan siempre un código estable legible por máquina.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Duplicate {resource} with {field} '{value}'")]
    Duplicate {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Invalid status transition from '{from}' to '{to}'")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Driver {0} already has a shipment in transit")]
    DriverBusy(Uuid),

    #[error("Vehicle {0} already has a shipment in transit")]
    VehicleBusy(Uuid),

    #[error("Target driver {0} already has a shipment in transit")]
    TargetDriverBusy(Uuid),

    #[error("Target vehicle {0} already has a shipment in transit")]
    TargetVehicleBusy(Uuid),

    #[error("Vehicle {0} is under maintenance")]
    VehicleMaintenance(Uuid),

    #[error("A driver is required to mark the shipment in transit")]
    DriverRequired,

    #[error("A vehicle is required to mark the shipment in transit")]
    VehicleRequired,

    #[error("Trip sheet in status '{0}' cannot be edited")]
    TripSheetNotEditable(String),

    #[error("Trip sheet is already settled")]
    TripSheetAlreadySettled,

    #[error("Trip sheet has no vehicle assigned")]
    TripSheetHasNoVehicle,

    #[error("Shipments not found: {0:?}")]
    ShipmentsNotFound(Vec<String>),

    #[error("Shipments are not in draft status: {0:?}")]
    InvalidShipmentStatus(Vec<String>),

    #[error("Shipments already linked to a trip sheet: {0:?}")]
    ShipmentsAlreadyLinked(Vec<String>),

    #[error("Dependency violation: {0}")]
    DependencyViolation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, message: String, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message,
            details: None,
            code: Some(code.to_string()),
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "Database Error",
                        "An error occurred while accessing the database".to_string(),
                        "DB_ERROR",
                    )
                    .with_details(json!({ "sql_error": e.to_string() })),
                )
            }

            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(
                    "Validation Error",
                    "The provided data is invalid".to_string(),
                    "VALIDATION_ERROR",
                )
                .with_details(json!(e)),
            ),

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("Not Found", msg, "NOT_FOUND"),
            ),

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Bad Request", msg, "VALIDATION_ERROR"),
            ),

            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse::new("Conflict", msg, "CONFLICT"),
            ),

            AppError::Duplicate { resource, field, value } => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "Conflict",
                    format!("{} with {} '{}' already exists", resource, field, value),
                    "DUPLICATE_REFERENCE",
                )
                .with_details(json!({ "resource": resource, "field": field, "value": value })),
            ),

            AppError::InvalidStatusTransition { ref from, ref to } => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "Conflict",
                    format!("Cannot transition from status '{}' to '{}'", from, to),
                    "INVALID_STATUS_TRANSITION",
                )
                .with_details(json!({ "from": from, "to": to })),
            ),

            AppError::DriverBusy(id) => {
                conflict_with_id("DRIVER_BUSY", "Driver already has a shipment in transit", "driver_id", id)
            }
            AppError::VehicleBusy(id) => {
                conflict_with_id("VEHICLE_BUSY", "Vehicle already has a shipment in transit", "vehicle_id", id)
            }
            AppError::TargetDriverBusy(id) => conflict_with_id(
                "TARGET_DRIVER_BUSY",
                "Target driver already has a shipment in transit",
                "driver_id",
                id,
            ),
            AppError::TargetVehicleBusy(id) => conflict_with_id(
                "TARGET_VEHICLE_BUSY",
                "Target vehicle already has a shipment in transit",
                "vehicle_id",
                id,
            ),
            AppError::VehicleMaintenance(id) => {
                conflict_with_id("VEHICLE_MAINTENANCE", "Vehicle is under maintenance", "vehicle_id", id)
            }

            AppError::DriverRequired => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "Conflict",
                    "A driver is required to mark the shipment in transit".to_string(),
                    "DRIVER_REQUIRED",
                ),
            ),

            AppError::VehicleRequired => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "Conflict",
                    "A vehicle is required to mark the shipment in transit".to_string(),
                    "VEHICLE_REQUIRED",
                ),
            ),

            AppError::TripSheetNotEditable(status) => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "Conflict",
                    format!("Trip sheet in status '{}' cannot be edited", status),
                    "TRIP_SHEET_NOT_EDITABLE",
                )
                .with_details(json!({ "status": status })),
            ),

            AppError::TripSheetAlreadySettled => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "Conflict",
                    "Trip sheet is already settled".to_string(),
                    "TRIP_SHEET_ALREADY_SETTLED",
                ),
            ),

            AppError::TripSheetHasNoVehicle => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "Conflict",
                    "Trip sheet has no vehicle assigned".to_string(),
                    "TRIP_SHEET_HAS_NO_VEHICLE",
                ),
            ),

            AppError::ShipmentsNotFound(refs) => conflict_with_refs(
                StatusCode::NOT_FOUND,
                "SHIPMENTS_NOT_FOUND",
                "Some shipments were not found",
                refs,
            ),

            AppError::InvalidShipmentStatus(refs) => conflict_with_refs(
                StatusCode::CONFLICT,
                "INVALID_SHIPMENT_STATUS",
                "Some shipments are not in draft status",
                refs,
            ),

            AppError::ShipmentsAlreadyLinked(refs) => conflict_with_refs(
                StatusCode::CONFLICT,
                "SHIPMENTS_ALREADY_LINKED",
                "Some shipments are already linked to a trip sheet",
                refs,
            ),

            AppError::DependencyViolation(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse::new("Conflict", msg, "DEPENDENCY_VIOLATION"),
            ),

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "Internal Server Error",
                        "An unexpected error occurred".to_string(),
                        "INTERNAL_ERROR",
                    )
                    .with_details(json!({ "internal_error": msg })),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

fn conflict_with_id(code: &str, message: &str, field: &str, id: Uuid) -> (StatusCode, ErrorResponse) {
    (
        StatusCode::CONFLICT,
        ErrorResponse::new("Conflict", message.to_string(), code)
            .with_details(json!({ field: id.to_string() })),
    )
}

fn conflict_with_refs(
    status: StatusCode,
    code: &str,
    message: &str,
    refs: Vec<String>,
) -> (StatusCode, ErrorResponse) {
    (
        status,
        ErrorResponse::new(
            if status == StatusCode::NOT_FOUND { "Not Found" } else { "Conflict" },
            message.to_string(),
            code,
        )
        .with_details(json!({ "references": refs })),
    )
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Mapear una violación de unicidad de Postgres (23505) a Duplicate;
/// cualquier otro error de base de datos pasa sin tocar.
pub fn map_unique_violation(
    e: sqlx::Error,
    resource: &'static str,
    field: &'static str,
    value: String,
) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.code().as_deref() == Some("23505") {
            return AppError::Duplicate { resource, field, value };
        }
    }
    AppError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    /// Router de prueba que devuelve errores reales a través de
    /// IntoResponse, no literales JSON.
    fn error_router(error: fn() -> AppError) -> Router {
        Router::new().route("/", get(move || async move { Err::<(), AppError>(error()) }))
    }

    async fn respond(error: fn() -> AppError) -> (StatusCode, serde_json::Value) {
        let response = error_router(error)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_driver_busy_carries_stable_code_and_id() {
        let (status, body) =
            respond(|| AppError::DriverBusy(Uuid::nil())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DRIVER_BUSY");
        assert_eq!(body["details"]["driver_id"], Uuid::nil().to_string());
    }

    #[tokio::test]
    async fn test_edit_lock_names_current_status() {
        let (status, body) =
            respond(|| AppError::TripSheetNotEditable("settled".to_string())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "TRIP_SHEET_NOT_EDITABLE");
        assert_eq!(body["details"]["status"], "settled");
    }

    #[tokio::test]
    async fn test_sheet_without_vehicle_is_conflict() {
        let (status, body) = respond(|| AppError::TripSheetHasNoVehicle).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "TRIP_SHEET_HAS_NO_VEHICLE");
    }

    #[tokio::test]
    async fn test_blocked_delete_is_dependency_violation() {
        let (status, body) = respond(|| {
            AppError::DependencyViolation(
                "Trip sheet TS-1 still has shipments in transit: SHP-1".to_string(),
            )
        })
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DEPENDENCY_VIOLATION");
        assert!(body["message"].as_str().unwrap().contains("SHP-1"));
    }

    #[tokio::test]
    async fn test_bulk_link_conflict_enumerates_references() {
        let (status, body) = respond(|| {
            AppError::ShipmentsAlreadyLinked(vec!["SHP-A".to_string(), "SHP-B".to_string()])
        })
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "SHIPMENTS_ALREADY_LINKED");
        assert_eq!(body["details"]["references"][1], "SHP-B");
    }

    #[tokio::test]
    async fn test_missing_shipments_map_to_not_found() {
        let (status, body) =
            respond(|| AppError::ShipmentsNotFound(vec!["SHP-X".to_string()])).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SHIPMENTS_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_bad_request_maps_to_validation_error() {
        let (status, body) =
            respond(|| AppError::BadRequest("Invalid registration number format".to_string()))
                .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
