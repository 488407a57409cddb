//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de
//! configuración del dispatch.

use std::env;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,
    /// Radio máximo de matching en kilómetros
    pub match_radius_km: f64,
    /// Cantidad máxima de candidatos por intento de matching
    pub match_limit: usize,
    /// Ventana de ocupación del conductor al aceptar, en minutos
    pub driver_busy_window_minutes: i64,
    /// Webhook de mensajería saliente (email/SMS); sin configurar solo loguea
    pub messaging_webhook_url: Option<String>,
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
            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("RATE_LIMIT_REQUESTS must be a valid number"),
            rate_limit_window: env::var("RATE_LIMIT_WINDOW")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("RATE_LIMIT_WINDOW must be a valid number"),
            match_radius_km: env::var("MATCH_RADIUS_KM")
                .unwrap_or_else(|_| "5.0".to_string())
                .parse()
                .expect("MATCH_RADIUS_KM must be a valid number"),
            match_limit: env::var("MATCH_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("MATCH_LIMIT must be a valid number"),
            driver_busy_window_minutes: env::var("DRIVER_BUSY_WINDOW_MINUTES")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .expect("DRIVER_BUSY_WINDOW_MINUTES must be a valid number"),
            messaging_webhook_url: env::var("MESSAGING_WEBHOOK_URL").ok(),
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
