//! Cliente del servicio externo de scoring (ML)
//!
//! Todas las consultas son best-effort: cualquier fallo de red, timeout
//! o respuesta malformada degrada a un valor neutro y el request del
//! usuario sigue adelante. Nunca propaga error.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Multiplicador neutro cuando el servicio no responde
pub const NEUTRAL_MULTIPLIER: f64 = 1.0;

#[derive(Debug, Deserialize)]
struct DriverScoreResponse {
    multiplier: f64,
}

#[derive(Debug, Deserialize)]
struct MaintenanceRiskResponse {
    risk_note: Option<String>,
}

/// Cliente HTTP hacia el servicio de ML, deshabilitado si no hay URL
#[derive(Clone)]
pub struct MlClient {
    base_url: Option<String>,
    client: Client,
}

impl MlClient {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { base_url, client }
    }

    pub fn disabled() -> Self {
        Self {
            base_url: None,
            client: Client::new(),
        }
    }

    /// Multiplicador de desempeño del conductor, 1.0 ante cualquier fallo
    pub async fn driver_score_multiplier(&self, driver_id: Uuid) -> f64 {
        let Some(base) = &self.base_url else {
            return NEUTRAL_MULTIPLIER;
        };

        let url = format!("{}/score/driver/{}", base.trim_end_matches('/'), driver_id);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<DriverScoreResponse>().await {
                    Ok(body) if body.multiplier.is_finite() && body.multiplier > 0.0 => {
                        body.multiplier
                    }
                    _ => NEUTRAL_MULTIPLIER,
                }
            }
            Ok(resp) => {
                log::debug!("⚠️ Servicio ML respondió {} para {}", resp.status(), url);
                NEUTRAL_MULTIPLIER
            }
            Err(e) => {
                log::debug!("⚠️ Servicio ML inaccesible ({}), se usa multiplicador neutro", e);
                NEUTRAL_MULTIPLIER
            }
        }
    }

    /// Nota de riesgo de mantenimiento para un vehículo, None ante fallo
    pub async fn maintenance_risk_note(&self, vehicle_id: Uuid) -> Option<String> {
        let base = self.base_url.as_ref()?;

        let url = format!("{}/predict/maintenance/{}", base.trim_end_matches('/'), vehicle_id);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp
                .json::<MaintenanceRiskResponse>()
                .await
                .ok()
                .and_then(|b| b.risk_note),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_client_is_neutral() {
        let ml = MlClient::disabled();
        let m = ml.driver_score_multiplier(Uuid::new_v4()).await;
        assert_eq!(m, NEUTRAL_MULTIPLIER);
        assert!(ml.maintenance_risk_note(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_neutral() {
        // Puerto cerrado: el cliente debe degradar sin error
        let ml = MlClient::new(
            Some("http://127.0.0.1:1".to_string()),
            Duration::from_millis(200),
        );
        let m = ml.driver_score_multiplier(Uuid::new_v4()).await;
        assert_eq!(m, NEUTRAL_MULTIPLIER);
    }
}
