//! Modelo de Driver
//!
//! Subconjunto del conductor relevante para matching y tarifas.
//! Mapea exactamente a la tabla drivers del schema.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::models::booking::GeoPoint;

/// Clase de vehículo solicitada - mapea al ENUM vehicle_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Hatchback,
    Sedan,
    Suv,
    Auto,
    Bike,
}

impl VehicleType {
    /// Tarifas publicadas por clase de vehículo. Se usan para la estimación
    /// al crear el booking, antes de conocer al conductor asignado.
    pub fn published_rates(&self) -> (Decimal, FareStructure) {
        let (base, per_km, per_minute, minimum) = match self {
            VehicleType::Bike => (15, 6, 1, 25),
            VehicleType::Auto => (20, 8, 1, 30),
            VehicleType::Hatchback => (25, 10, 2, 40),
            VehicleType::Sedan => (30, 12, 2, 50),
            VehicleType::Suv => (40, 15, 3, 70),
        };
        (
            Decimal::new(base, 0),
            FareStructure {
                per_km_rate: Decimal::new(per_km, 0),
                waiting_charge_per_minute: Decimal::new(per_minute, 0),
                minimum_fare: Decimal::new(minimum, 0),
            },
        )
    }
}

/// Estructura tarifaria por vehículo (la tarifa base viaja aparte)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareStructure {
    pub per_km_rate: Decimal,
    pub waiting_charge_per_minute: Decimal,
    pub minimum_fare: Decimal,
}

/// Driver principal - mapea exactamente a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub lat: f64,
    pub lng: f64,
    pub is_online: bool,
    pub busy_until: Option<DateTime<Utc>>,
    pub vehicle_type: VehicleType,
    pub base_fare: Decimal,
    pub per_km_rate: Decimal,
    pub waiting_charge_per_minute: Decimal,
    pub minimum_fare: Decimal,
    pub rating: f64,
    pub completed_trips: i32,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    pub fn fare_structure(&self) -> FareStructure {
        FareStructure {
            per_km_rate: self.per_km_rate,
            waiting_charge_per_minute: self.waiting_charge_per_minute,
            minimum_fare: self.minimum_fare,
        }
    }

    /// Un conductor offline o con busy_until en el futuro queda excluido
    /// del matching.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.is_online && self.busy_until.map_or(true, |until| until <= now)
    }

    pub fn is_eligible_for(&self, vehicle_type: VehicleType, now: DateTime<Utc>) -> bool {
        self.is_available(now) && self.vehicle_type == vehicle_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_driver() -> Driver {
        Driver {
            id: Uuid::new_v4(),
            name: "Test Driver".to_string(),
            phone: "+5215512345678".to_string(),
            lat: 19.4326,
            lng: -99.1332,
            is_online: true,
            busy_until: None,
            vehicle_type: VehicleType::Sedan,
            base_fare: Decimal::new(200, 1),
            per_km_rate: Decimal::new(100, 1),
            waiting_charge_per_minute: Decimal::new(20, 1),
            minimum_fare: Decimal::new(500, 1),
            rating: 4.8,
            completed_trips: 120,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn offline_driver_is_not_available() {
        let mut driver = sample_driver();
        driver.is_online = false;
        assert!(!driver.is_available(Utc::now()));
    }

    #[test]
    fn busy_driver_is_not_available_until_window_passes() {
        let now = Utc::now();
        let mut driver = sample_driver();

        driver.busy_until = Some(now + Duration::minutes(30));
        assert!(!driver.is_available(now));

        driver.busy_until = Some(now - Duration::minutes(1));
        assert!(driver.is_available(now));
    }

    #[test]
    fn eligibility_requires_vehicle_type_match() {
        let driver = sample_driver();
        let now = Utc::now();

        assert!(driver.is_eligible_for(VehicleType::Sedan, now));
        assert!(!driver.is_eligible_for(VehicleType::Suv, now));
    }
}
