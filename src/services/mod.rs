//! Servicios de dominio

pub mod availability_service;
pub mod dispatch_service;
pub mod geocoding_service;
pub mod invoicing_service;
pub mod ml_client;
pub mod optimizer_client;
pub mod routing_service;

pub use dispatch_service::DispatchService;
pub use routing_service::RoutingService;
