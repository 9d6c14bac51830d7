mod cache;
mod config;
mod controllers;
mod database;
mod dto;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod state;
mod utils;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use cache::redis_client::RedisClient;
use config::environment::EnvironmentConfig;
use database::DatabaseConnection;
use middleware::cors::cors_middleware;
use services::optimizer_client::{NearestNeighborOptimizer, RemoteOptimizer, RouteOptimizer};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚛 Fleet Dispatch - asignación de flota y hojas de ruta");
    info!("=======================================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::new_default().await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    let pool = db_connection.pool().clone();

    // Redis es opcional: sin cache el secuenciador repite llamadas al
    // optimizador, nada más
    let redis_client = match RedisClient::new(cache::CacheConfig::default()).await {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("⚠️ Redis no disponible ({}), se opera sin cache de rutas", e);
            None
        }
    };

    // Optimizador remoto con timeout acotado; sin URL configurada la
    // heurística local es el optimizador primario
    let optimizer: Arc<dyn RouteOptimizer> = match &config.optimizer_url {
        Some(url) => Arc::new(RemoteOptimizer::new(url.clone(), config.optimizer_timeout)?),
        None => {
            warn!("⚠️ OPTIMIZER_URL no configurada, se secuencia con nearest-neighbor local");
            Arc::new(NearestNeighborOptimizer)
        }
    };

    let app_state = AppState::new(pool, config.clone(), redis_client, optimizer);

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/shipment", routes::create_shipment_router())
        .nest("/api/trip-sheet", routes::create_trip_sheet_router())
        .nest("/api/dispatch", routes::create_dispatch_router())
        .nest("/api/routing", routes::create_routing_router())
        .nest("/api/vehicle", routes::create_vehicle_router())
        .nest("/api/driver", routes::create_driver_router())
        .layer(cors_middleware(&config.cors_origins))
        .with_state(app_state);

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("📦 Shipments:");
    info!("   POST /api/shipment - Crear envío");
    info!("   GET  /api/shipment - Listar envíos");
    info!("   PATCH /api/shipment/:id/status - Transición de estado");
    info!("   GET  /api/shipment/:id/invoice - Factura del envío");
    info!("📋 Trip sheets:");
    info!("   POST /api/trip-sheet - Crear hoja de ruta");
    info!("   POST /api/trip-sheet/:id/settle - Liquidar hoja");
    info!("   POST /api/trip-sheet/group - Agrupar envíos sin hoja");
    info!("🎯 Dispatch:");
    info!("   POST /api/dispatch/suggestions - Sugerir vehículos");
    info!("   POST /api/dispatch/auto-assign - Auto-asignación por lote");
    info!("🗺️ Routing:");
    info!("   POST /api/routing/optimize - Secuenciar paradas");
    info!("   GET  /api/routing/trip-sheet/:id/suggest - Plan para una hoja");
    info!("🚚 Registros: /api/vehicle, /api/driver");

    let server_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("❌ Error del servidor: {}", e);
                anyhow::anyhow!(e)
            })
    });

    if let Err(e) = server_handle.await? {
        error!("❌ Servidor terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Health check simple
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "fleet_dispatch",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal SIGTERM recibida, apagando servidor...");
        },
    }
}
