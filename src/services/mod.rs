//! Services module
//!
//! Este módulo contiene la lógica de negocio del core de dispatch:
//! matching geográfico, tarifas, máquina de estados del booking,
//! notificaciones push y mensajería saliente.

pub mod booking_service;
pub mod fare_engine;
pub mod geo_matcher;
pub mod messaging_service;
pub mod notification_hub;

pub use booking_service::{BookingService, MatchingConfig};
pub use fare_engine::FareEngine;
pub use geo_matcher::GeoMatcher;
pub use messaging_service::MessagingService;
pub use notification_hub::NotificationHub;
