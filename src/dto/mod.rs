//! DTOs de la API
//!
//! Contratos de request/response por operación, validados en el borde
//! antes de entrar a cualquier componente del motor.

pub mod common;
pub mod dispatch_dto;
pub mod driver_dto;
pub mod routing_dto;
pub mod shipment_dto;
pub mod trip_sheet_dto;
pub mod vehicle_dto;
