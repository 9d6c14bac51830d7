//! Controladores HTTP

pub mod driver_controller;
pub mod shipment_controller;
pub mod trip_sheet_controller;
pub mod vehicle_controller;

pub use driver_controller::DriverController;
pub use shipment_controller::ShipmentController;
pub use trip_sheet_controller::TripSheetController;
pub use vehicle_controller::VehicleController;
