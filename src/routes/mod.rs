//! Definición de rutas de la API

pub mod dispatch_routes;
pub mod driver_routes;
pub mod routing_routes;
pub mod shipment_routes;
pub mod trip_sheet_routes;
pub mod vehicle_routes;

pub use dispatch_routes::create_dispatch_router;
pub use driver_routes::create_driver_router;
pub use routing_routes::create_routing_router;
pub use shipment_routes::create_shipment_router;
pub use trip_sheet_routes::create_trip_sheet_router;
pub use vehicle_routes::create_vehicle_router;
