//! DTOs de Booking

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::{Booking, BookingStatus, CancelActor, FareBreakdown};
use crate::models::driver::VehicleType;

/// Request para crear un booking
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub customer_id: Uuid,

    #[validate(range(min = -90.0, max = 90.0))]
    pub pickup_lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub pickup_lng: f64,

    #[validate(length(min = 3, max = 255))]
    pub pickup_address: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub dropoff_lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub dropoff_lng: f64,

    #[validate(length(min = 3, max = 255))]
    pub dropoff_address: String,

    pub vehicle_type: VehicleType,

    /// Selección explícita de conductor: salta el matching si el conductor
    /// sigue siendo elegible
    pub selected_driver_id: Option<Uuid>,

    /// Hora de pickup solicitada; puede ser futura (booking agendado)
    pub booking_time: Option<DateTime<Utc>>,
}

/// Request de aceptación: debe venir del conductor asignado
#[derive(Debug, Deserialize, Validate)]
pub struct AcceptBookingRequest {
    pub driver_id: Uuid,
}

/// Request de rechazo: debe venir del conductor asignado
#[derive(Debug, Deserialize, Validate)]
pub struct RejectBookingRequest {
    pub driver_id: Uuid,
}

/// Request de verificación de OTP para arrancar el viaje
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 4, max = 6))]
    pub otp: String,
}

/// Request de finalización con los datos reales del viaje
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteBookingRequest {
    #[validate(range(min = 0.0))]
    pub actual_distance_km: f64,

    #[validate(range(min = 0))]
    pub duration_seconds: i64,

    #[validate(range(min = 0))]
    pub waiting_time_seconds: i64,
}

/// Request de cancelación con el actor que la pide
#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub cancelled_by: CancelActor,
}

/// Response de booking para la API. Nunca incluye el OTP.
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
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
    pub fare_breakdown: Option<FareBreakdown>,
    pub status: BookingStatus,
    pub rejection_count: i32,
    pub cancelled_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub booking_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            customer_id: booking.customer_id,
            driver_id: booking.driver_id,
            pickup_lat: booking.pickup_lat,
            pickup_lng: booking.pickup_lng,
            pickup_address: booking.pickup_address.clone(),
            dropoff_lat: booking.dropoff_lat,
            dropoff_lng: booking.dropoff_lng,
            dropoff_address: booking.dropoff_address.clone(),
            vehicle_type: booking.vehicle_type,
            estimated_distance_km: booking.estimated_distance_km,
            estimated_fare: booking.estimated_fare,
            actual_distance_km: booking.actual_distance_km,
            actual_fare: booking.actual_fare,
            fare_breakdown: booking.fare_breakdown.as_ref().map(|b| b.0.clone()),
            status: booking.status,
            rejection_count: booking.rejection_count,
            cancelled_by: booking.cancelled_by.clone(),
            created_at: booking.created_at,
            booking_time: booking.booking_time,
            start_time: booking.start_time,
            end_time: booking.end_time,
        }
    }
}
