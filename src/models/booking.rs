//! Modelo de Booking
//!
//! Este módulo contiene el struct Booking y el ciclo de vida de estados.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::driver::VehicleType;

/// Estado del booking - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Created,
    PendingMatch,
    Assigned,
    Accepted,
    RideStarted,
    RejectedByDriver,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Un booking terminal no admite más transiciones
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Estados en los que el booking tiene exactamente un conductor asignado
    pub fn holds_driver(&self) -> bool {
        matches!(
            self,
            BookingStatus::Assigned
                | BookingStatus::Accepted
                | BookingStatus::RideStarted
                | BookingStatus::Completed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Created => "CREATED",
            BookingStatus::PendingMatch => "PENDING_MATCH",
            BookingStatus::Assigned => "ASSIGNED",
            BookingStatus::Accepted => "ACCEPTED",
            BookingStatus::RideStarted => "RIDE_STARTED",
            BookingStatus::RejectedByDriver => "REJECTED_BY_DRIVER",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actor que solicita una cancelación - se guarda como campo de auditoría
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CancelActor {
    Customer,
    Driver,
    System,
}

impl CancelActor {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelActor::Customer => "customer",
            CancelActor::Driver => "driver",
            CancelActor::System => "system",
        }
    }
}

/// Punto geográfico con dirección legible
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Desglose de tarifa - cada término intermedio expuesto para auditoría
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareBreakdown {
    pub base_fare: Decimal,
    pub distance_km: f64,
    pub distance_fare: Decimal,
    pub waiting_minutes: i64,
    pub waiting_charge: Decimal,
    pub computed_total: Decimal,
    pub minimum_fare: Decimal,
    pub total: Decimal,
}

/// Booking principal - mapea exactamente a la tabla bookings
///
/// El campo `ride_otp` es inmutable una vez generado y nunca se serializa
/// hacia la API (solo vive del lado del servidor).
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub pickup_address: String,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub dropoff_address: String,
    pub vehicle_type: VehicleType,
    pub estimated_distance_km: f64,
    pub estimated_fare: Decimal,
    pub actual_distance_km: Option<f64>,
    pub actual_fare: Option<Decimal>,
    pub fare_breakdown: Option<sqlx::types::Json<FareBreakdown>>,
    pub ride_otp: String,
    pub otp_attempts: i32,
    pub status: BookingStatus,
    pub rejection_count: i32,
    pub rejected_driver_ids: Vec<Uuid>,
    pub cancelled_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub booking_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn pickup(&self) -> GeoPoint {
        GeoPoint::new(self.pickup_lat, self.pickup_lng)
    }

    /// Conjunto de conductores excluidos del matching para este booking
    pub fn rejection_tracker(&self) -> RejectionTracker {
        RejectionTracker::from_ids(self.rejected_driver_ids.clone())
    }
}

/// Registro append-only de conductores que rechazaron un booking.
///
/// Propiedad exclusiva de la máquina de estados: ningún otro componente
/// muta este conjunto. Un id agregado aquí nunca vuelve a ser candidato
/// para el mismo booking.
#[derive(Debug, Clone, Default)]
pub struct RejectionTracker {
    driver_ids: Vec<Uuid>,
}

impl RejectionTracker {
    pub fn from_ids(driver_ids: Vec<Uuid>) -> Self {
        Self { driver_ids }
    }

    /// Agregar un conductor al conjunto. Idempotente: agregar el mismo id
    /// dos veces no tiene efecto adicional. Devuelve true si se insertó.
    pub fn add(&mut self, driver_id: Uuid) -> bool {
        if self.driver_ids.contains(&driver_id) {
            return false;
        }
        self.driver_ids.push(driver_id);
        true
    }

    pub fn contains(&self, driver_id: Uuid) -> bool {
        self.driver_ids.contains(&driver_id)
    }

    pub fn excluded_set(&self) -> HashSet<Uuid> {
        self.driver_ids.iter().copied().collect()
    }

    pub fn into_ids(self) -> Vec<Uuid> {
        self.driver_ids
    }
}
