//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::time::Duration;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    // Optimizador externo de secuencias de puntos; sin URL se usa la
    // heurística local
    pub optimizer_url: Option<String>,
    pub optimizer_timeout: Duration,
    // Servicio ML de scoring (best-effort, nunca bloquea una operación)
    pub ml_service_url: Option<String>,
    pub ml_service_timeout: Duration,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
                .collect(),
            optimizer_url: env::var("OPTIMIZER_URL").ok().filter(|s| !s.is_empty()),
            optimizer_timeout: Duration::from_secs(
                env::var("OPTIMIZER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .expect("OPTIMIZER_TIMEOUT_SECS must be a valid number"),
            ),
            ml_service_url: env::var("ML_SERVICE_URL").ok(),
            ml_service_timeout: Duration::from_secs(2),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
