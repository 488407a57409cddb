//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. El NotificationHub es una instancia
//! construida aquí explícitamente y compartida via Arc; no hay estado
//! global de módulo.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::booking_repository::PgBookingStore;
use crate::repositories::driver_repository::PgDriverDirectory;
use crate::repositories::{BookingStore, DriverDirectory};
use crate::services::booking_service::{BookingService, MatchingConfig};
use crate::services::messaging_service::MessagingService;
use crate::services::notification_hub::NotificationHub;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub hub: Arc<NotificationHub>,
    pub bookings: Arc<BookingService>,
    pub drivers: Arc<dyn DriverDirectory>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let hub = Arc::new(NotificationHub::new());
        let store: Arc<dyn BookingStore> = Arc::new(PgBookingStore::new(pool.clone()));
        let directory: Arc<dyn DriverDirectory> = Arc::new(PgDriverDirectory::new(pool.clone()));
        let messaging = MessagingService::new(config.messaging_webhook_url.clone());
        let matching = MatchingConfig {
            max_radius_km: config.match_radius_km,
            limit: config.match_limit,
            busy_window_minutes: config.driver_busy_window_minutes,
        };

        let bookings = Arc::new(BookingService::new(
            store,
            directory.clone(),
            hub.clone(),
            messaging,
            matching,
        ));

        Self {
            pool,
            config,
            hub,
            bookings,
            drivers: directory,
        }
    }
}
