//! Repositorios de acceso a datos

pub mod driver_repository;
pub mod shipment_repository;
pub mod trip_sheet_repository;
pub mod vehicle_repository;

pub use driver_repository::DriverRepository;
pub use shipment_repository::ShipmentRepository;
pub use trip_sheet_repository::TripSheetRepository;
pub use vehicle_repository::VehicleRepository;
