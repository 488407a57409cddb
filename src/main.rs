use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use dotenvy::dotenv;

use ride_dispatch::config::environment::EnvironmentConfig;
use ride_dispatch::database::connection::create_pool;
use ride_dispatch::middleware::cors::{cors_middleware, cors_middleware_with_origins};
use ride_dispatch::middleware::rate_limit::{rate_limit_middleware, RateLimitState};
use ride_dispatch::routes;
use ride_dispatch::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::default();

    // Configurar logging
    let log_level = if config.is_development() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("🚕 Ride Dispatch - Backend de despacho de viajes");
    info!("================================================");
    info!("🌍 Entorno: {} ({})", config.environment, config.server_url());

    if config.is_production() && config.cors_origins.is_empty() {
        tracing::warn!("⚠️ CORS permisivo en producción: configurar CORS_ORIGINS");
    }

    // Inicializar base de datos
    let pool = match create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let cors = if config.cors_origins.is_empty() {
        cors_middleware()
    } else {
        cors_middleware_with_origins(config.cors_origins.clone())
    };
    let rate_limit_state = RateLimitState::new(&config);

    let app_state = AppState::new(pool, config.clone());

    let app = Router::new()
        .nest("/api/booking", routes::booking_routes::create_booking_router())
        .nest("/api/driver", routes::driver_routes::create_driver_router())
        .nest(
            "/api/notifications",
            routes::notification_routes::create_notification_router(),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit_state,
            rate_limit_middleware,
        ))
        .layer(cors)
        .with_state(app_state);

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("📒 Booking:");
    info!("   POST /api/booking - Crear booking");
    info!("   GET  /api/booking/:id - Obtener booking");
    info!("   POST /api/booking/:id/accept - Aceptar (conductor asignado)");
    info!("   POST /api/booking/:id/reject - Rechazar y reasignar");
    info!("   POST /api/booking/:id/start - Verificar OTP y arrancar");
    info!("   POST /api/booking/:id/complete - Completar con tarifa real");
    info!("   POST /api/booking/:id/cancel - Cancelar");
    info!("   POST /api/booking/:id/rematch - Reintentar matching");
    info!("🚗 Driver:");
    info!("   POST /api/driver - Registrar conductor");
    info!("   GET  /api/driver/:id - Obtener conductor");
    info!("   GET  /api/driver/nearby - Conductores cercanos");
    info!("   PUT  /api/driver/:id/location - Heartbeat de ubicación");
    info!("   PUT  /api/driver/:id/online - Cambiar disponibilidad");
    info!("📡 Notificaciones:");
    info!("   GET    /api/notifications/subscribe/:driver_id - Canal SSE");
    info!("   DELETE /api/notifications/subscribe/:driver_id - Cerrar canal");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Servidor detenido");
    Ok(())
}

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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Señal de apagado recibida");
}
