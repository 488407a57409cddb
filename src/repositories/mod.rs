//! Repositorios y contratos de persistencia
//!
//! El núcleo de dispatch es agnóstico del storage: habla con el directorio
//! de conductores y con el store de bookings a través de estos traits.
//! La implementación PostgreSQL vive en este módulo; la implementación
//! en memoria (tests y desarrollo local) en `memory`.

pub mod booking_repository;
pub mod driver_repository;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::booking::{Booking, GeoPoint};
use crate::models::driver::Driver;
use crate::utils::errors::AppError;

/// Directorio de conductores: consultas geográficas y actualizaciones de
/// disponibilidad. `query_nearby` devuelve un snapshot grueso (prefiltro por
/// radio); el filtrado fino y el ordenamiento son del GeoMatcher.
#[async_trait]
pub trait DriverDirectory: Send + Sync {
    async fn register(&self, driver: Driver) -> Result<Driver, AppError>;

    async fn query_nearby(&self, point: GeoPoint, radius_km: f64) -> Result<Vec<Driver>, AppError>;

    async fn get_driver(&self, id: Uuid) -> Result<Option<Driver>, AppError>;

    async fn set_busy_until(
        &self,
        id: Uuid,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError>;

    async fn set_online(&self, id: Uuid, online: bool) -> Result<(), AppError>;

    async fn update_location(&self, id: Uuid, point: GeoPoint) -> Result<(), AppError>;

    async fn record_completed_trip(&self, id: Uuid) -> Result<(), AppError>;
}

/// Store de bookings. Las escrituras de cada booking se serializan con el
/// lock por booking del servicio, por lo que `update` reemplaza la fila
/// completa.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<(), AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError>;

    async fn update(&self, booking: &Booking) -> Result<(), AppError>;
}
