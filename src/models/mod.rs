//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL con las convenciones estándar.

pub mod driver;
pub mod invoice;
pub mod money;
pub mod shipment;
pub mod trip_sheet;
pub mod vehicle;
