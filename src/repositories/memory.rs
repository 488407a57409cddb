//! Implementaciones en memoria del directorio y el store
//!
//! Se usan en los tests de integración y para desarrollo local sin
//! PostgreSQL. Respetan los mismos contratos que las implementaciones
//! de base de datos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::booking::{Booking, GeoPoint};
use crate::models::driver::Driver;
use crate::repositories::{BookingStore, DriverDirectory};
use crate::services::geo_matcher::haversine_km;
use crate::utils::errors::{not_found_error, AppError};

#[derive(Clone, Default)]
pub struct InMemoryDriverDirectory {
    drivers: Arc<RwLock<HashMap<Uuid, Driver>>>,
}

impl InMemoryDriverDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DriverDirectory for InMemoryDriverDirectory {
    async fn register(&self, driver: Driver) -> Result<Driver, AppError> {
        let mut drivers = self.drivers.write().await;
        drivers.insert(driver.id, driver.clone());
        Ok(driver)
    }

    async fn query_nearby(&self, point: GeoPoint, radius_km: f64) -> Result<Vec<Driver>, AppError> {
        let drivers = self.drivers.read().await;
        Ok(drivers
            .values()
            .filter(|d| d.is_online && haversine_km(&point, &d.location()) <= radius_km)
            .cloned()
            .collect())
    }

    async fn get_driver(&self, id: Uuid) -> Result<Option<Driver>, AppError> {
        Ok(self.drivers.read().await.get(&id).cloned())
    }

    async fn set_busy_until(
        &self,
        id: Uuid,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        let mut drivers = self.drivers.write().await;
        let driver = drivers
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Driver", &id.to_string()))?;
        driver.busy_until = until;
        driver.updated_at = Utc::now();
        Ok(())
    }

    async fn set_online(&self, id: Uuid, online: bool) -> Result<(), AppError> {
        let mut drivers = self.drivers.write().await;
        let driver = drivers
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Driver", &id.to_string()))?;
        driver.is_online = online;
        driver.updated_at = Utc::now();
        Ok(())
    }

    async fn update_location(&self, id: Uuid, point: GeoPoint) -> Result<(), AppError> {
        let mut drivers = self.drivers.write().await;
        let driver = drivers
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Driver", &id.to_string()))?;
        driver.lat = point.lat;
        driver.lng = point.lng;
        driver.updated_at = Utc::now();
        Ok(())
    }

    async fn record_completed_trip(&self, id: Uuid) -> Result<(), AppError> {
        let mut drivers = self.drivers.write().await;
        let driver = drivers
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Driver", &id.to_string()))?;
        driver.completed_trips += 1;
        driver.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    bookings: Arc<RwLock<HashMap<Uuid, Booking>>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create(&self, booking: &Booking) -> Result<(), AppError> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(AppError::Conflict(format!(
                "Booking with id '{}' already exists",
                booking.id
            )));
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn update(&self, booking: &Booking) -> Result<(), AppError> {
        let mut bookings = self.bookings.write().await;
        let stored = bookings
            .get_mut(&booking.id)
            .ok_or_else(|| not_found_error("Booking", &booking.id.to_string()))?;
        // ride_otp es inmutable una vez generado
        let mut updated = booking.clone();
        updated.ride_otp = stored.ride_otp.clone();
        *stored = updated;
        Ok(())
    }
}
