//! DTOs de Driver

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::driver::{Driver, VehicleType};
use crate::services::geo_matcher::DriverCandidate;

/// Request para registrar un conductor
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterDriverRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(length(min = 8, max = 20))]
    pub phone: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,

    pub vehicle_type: VehicleType,

    pub base_fare: Decimal,
    pub per_km_rate: Decimal,
    pub waiting_charge_per_minute: Decimal,
    pub minimum_fare: Decimal,
}

/// Request de heartbeat de ubicación
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

/// Request para cambiar disponibilidad
#[derive(Debug, Deserialize)]
pub struct SetOnlineRequest {
    pub is_online: bool,
}

/// Query de conductores cercanos
#[derive(Debug, Deserialize)]
pub struct NearbyDriversQuery {
    pub lat: f64,
    pub lng: f64,
    pub vehicle_type: VehicleType,
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
}

/// Response de conductor para la API
#[derive(Debug, Serialize)]
pub struct DriverResponse {
    pub id: Uuid,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub is_online: bool,
    pub vehicle_type: VehicleType,
    pub rating: f64,
    pub completed_trips: i32,
}

impl From<&Driver> for DriverResponse {
    fn from(driver: &Driver) -> Self {
        Self {
            id: driver.id,
            name: driver.name.clone(),
            lat: driver.lat,
            lng: driver.lng,
            is_online: driver.is_online,
            vehicle_type: driver.vehicle_type,
            rating: driver.rating,
            completed_trips: driver.completed_trips,
        }
    }
}

/// Conductor cercano con la distancia ya calculada
#[derive(Debug, Serialize)]
pub struct NearbyDriverResponse {
    pub driver: DriverResponse,
    pub distance_from_user_km: f64,
}

impl From<&DriverCandidate> for NearbyDriverResponse {
    fn from(candidate: &DriverCandidate) -> Self {
        Self {
            driver: DriverResponse::from(&candidate.driver),
            distance_from_user_km: candidate.distance_from_user_km,
        }
    }
}
