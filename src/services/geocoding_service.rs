//! Geocoding simulado y distancias
//!
//! Las direcciones de texto libre se mapean a coordenadas aproximadas
//! de ciudades conocidas (sin geocoding real). La distancia es
//! great-circle (haversine, R = 6371 km).

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Punto geográfico aproximado
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Punto de partida por defecto cuando nada resuelve (Delhi)
pub const DEFAULT_ORIGIN: Coordinates = Coordinates {
    latitude: 28.6139,
    longitude: 77.2090,
};

/// Velocidad media asumida para estimar tiempos de viaje
pub const AVERAGE_SPEED_KMH: f64 = 60.0;

lazy_static! {
    /// Ciudades principales con coordenadas aproximadas
    static ref CITY_TABLE: Vec<(&'static str, Coordinates)> = vec![
        // Norte
        ("delhi", Coordinates { latitude: 28.6139, longitude: 77.2090 }),
        ("jaipur", Coordinates { latitude: 26.9124, longitude: 75.7873 }),
        ("lucknow", Coordinates { latitude: 26.8467, longitude: 80.9462 }),
        ("kanpur", Coordinates { latitude: 26.4499, longitude: 80.3319 }),
        ("ghaziabad", Coordinates { latitude: 28.6692, longitude: 77.4538 }),
        ("ludhiana", Coordinates { latitude: 30.9010, longitude: 75.8573 }),
        ("agra", Coordinates { latitude: 27.1767, longitude: 78.0081 }),
        ("faridabad", Coordinates { latitude: 28.4089, longitude: 77.3178 }),
        ("meerut", Coordinates { latitude: 28.9845, longitude: 77.7064 }),
        ("varanasi", Coordinates { latitude: 25.3176, longitude: 82.9739 }),
        ("srinagar", Coordinates { latitude: 34.0837, longitude: 74.7973 }),
        ("amritsar", Coordinates { latitude: 31.6340, longitude: 74.8723 }),
        ("allahabad", Coordinates { latitude: 25.4358, longitude: 81.8463 }),
        ("chandigarh", Coordinates { latitude: 30.7333, longitude: 76.7794 }),
        ("jodhpur", Coordinates { latitude: 26.2389, longitude: 73.0243 }),
        ("kota", Coordinates { latitude: 25.2138, longitude: 75.8648 }),
        // Oeste
        ("mumbai", Coordinates { latitude: 19.0760, longitude: 72.8777 }),
        ("pune", Coordinates { latitude: 18.5204, longitude: 73.8567 }),
        ("ahmedabad", Coordinates { latitude: 23.0225, longitude: 72.5714 }),
        ("surat", Coordinates { latitude: 21.1702, longitude: 72.8311 }),
        ("thane", Coordinates { latitude: 19.2183, longitude: 72.9781 }),
        ("vadodara", Coordinates { latitude: 22.3072, longitude: 73.1812 }),
        ("rajkot", Coordinates { latitude: 22.3039, longitude: 70.8022 }),
        ("nashik", Coordinates { latitude: 19.9975, longitude: 73.7898 }),
        ("aurangabad", Coordinates { latitude: 19.8762, longitude: 75.3433 }),
        ("navi mumbai", Coordinates { latitude: 19.0330, longitude: 73.0297 }),
        ("nagpur", Coordinates { latitude: 21.1458, longitude: 79.0882 }),
        // Sur
        ("bangalore", Coordinates { latitude: 12.9716, longitude: 77.5946 }),
        ("chennai", Coordinates { latitude: 13.0827, longitude: 80.2707 }),
        ("hyderabad", Coordinates { latitude: 17.3850, longitude: 78.4867 }),
        ("visakhapatnam", Coordinates { latitude: 17.6868, longitude: 83.2185 }),
        ("coimbatore", Coordinates { latitude: 11.0168, longitude: 76.9558 }),
        ("vijayawada", Coordinates { latitude: 16.5062, longitude: 80.6480 }),
        ("madurai", Coordinates { latitude: 9.9252, longitude: 78.1198 }),
        ("mysore", Coordinates { latitude: 12.2958, longitude: 76.6394 }),
        ("kochi", Coordinates { latitude: 9.9312, longitude: 76.2673 }),
        ("thiruvananthapuram", Coordinates { latitude: 8.5241, longitude: 76.9366 }),
        // Este y centro
        ("kolkata", Coordinates { latitude: 22.5726, longitude: 88.3639 }),
        ("indore", Coordinates { latitude: 22.7196, longitude: 75.8577 }),
        ("bhopal", Coordinates { latitude: 23.2599, longitude: 77.4126 }),
        ("patna", Coordinates { latitude: 25.5941, longitude: 85.1376 }),
        ("ranchi", Coordinates { latitude: 23.3441, longitude: 85.3096 }),
        ("dhanbad", Coordinates { latitude: 23.7957, longitude: 86.4304 }),
        ("howrah", Coordinates { latitude: 22.5958, longitude: 88.2636 }),
        ("gwalior", Coordinates { latitude: 26.2183, longitude: 78.1828 }),
        ("jabalpur", Coordinates { latitude: 23.1815, longitude: 79.9864 }),
        ("guwahati", Coordinates { latitude: 26.1445, longitude: 91.7362 }),
        ("bhubaneswar", Coordinates { latitude: 20.2961, longitude: 85.8245 }),
        ("raipur", Coordinates { latitude: 21.2514, longitude: 81.6296 }),
    ];
}

/// Adaptador de geocoding simulado
#[derive(Debug, Clone, Default)]
pub struct GeocodingService;

impl GeocodingService {
    pub fn new() -> Self {
        Self
    }

    /// Resolver una dirección libre a coordenadas aproximadas.
    /// Devuelve None para direcciones que no mencionan ninguna
    /// ciudad conocida.
    pub fn resolve(&self, address: &str) -> Option<Coordinates> {
        let normalized = address.to_lowercase();
        CITY_TABLE
            .iter()
            .find(|(city, _)| normalized.contains(city))
            .map(|(_, coords)| *coords)
    }

    /// Distancia great-circle en kilómetros
    pub fn distance_km(&self, a: Coordinates, b: Coordinates) -> f64 {
        haversine_km(a, b)
    }

    /// Distancia entre dos direcciones, si ambas resuelven
    pub fn address_distance_km(&self, from: &str, to: &str) -> Option<f64> {
        let a = self.resolve(from)?;
        let b = self.resolve(to)?;
        Some(haversine_km(a, b))
    }
}

/// Haversine con radio terrestre de 6371 km
pub fn haversine_km(p1: Coordinates, p2: Coordinates) -> f64 {
    const R: f64 = 6371.0;
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lon = (p2.longitude - p1.longitude).to_radians();

    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    R * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_city() {
        let geo = GeocodingService::new();
        let coords = geo.resolve("Transport Nagar, Delhi").unwrap();
        assert!((coords.latitude - 28.6139).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let geo = GeocodingService::new();
        assert!(geo.resolve("MUMBAI Port Trust").is_some());
    }

    #[test]
    fn test_resolve_unknown_address() {
        let geo = GeocodingService::new();
        assert!(geo.resolve("Somewhere unnamed").is_none());
    }

    #[test]
    fn test_haversine_delhi_mumbai() {
        let geo = GeocodingService::new();
        let d = geo
            .address_distance_km("Azadpur, Delhi", "Bhiwandi, Mumbai")
            .unwrap();
        // Distancia real aprox. 1150 km
        assert!(d > 1100.0 && d < 1200.0, "distancia fuera de rango: {}", d);
    }

    #[test]
    fn test_haversine_zero_distance() {
        assert!(haversine_km(DEFAULT_ORIGIN, DEFAULT_ORIGIN).abs() < 1e-9);
    }
}
