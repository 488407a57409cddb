//! GeoMatcher: selección de candidatos por distancia de gran círculo
//!
//! Lectura pura sobre un snapshot de conductores. El resultado vacío no es
//! un error: significa "no hay conductor elegible" y el llamador lo trata
//! como estado terminal de ese intento de matching.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::booking::GeoPoint;
use crate::models::driver::{Driver, VehicleType};

/// Radio de búsqueda por defecto
pub const DEFAULT_MAX_RADIUS_KM: f64 = 5.0;

/// Cantidad máxima de candidatos por defecto
pub const DEFAULT_MATCH_LIMIT: usize = 10;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distancia haversine entre dos puntos, en kilómetros
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lng.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Candidato con la distancia ya computada, para que los llamadores
/// nunca la recalculen
#[derive(Debug, Clone)]
pub struct DriverCandidate {
    pub driver: Driver,
    pub distance_from_user_km: f64,
}

pub struct GeoMatcher;

impl GeoMatcher {
    /// Filtrar y ordenar candidatos elegibles alrededor del pickup.
    ///
    /// Elegible: online, no ocupado a `now`, tipo de vehículo correcto,
    /// no excluido, dentro de `max_radius_km`. Orden ascendente por
    /// distancia; empates por rating desc, viajes completados desc e id
    /// asc (determinista).
    pub fn find_nearest(
        pickup: &GeoPoint,
        vehicle_type: VehicleType,
        exclude_driver_ids: &HashSet<Uuid>,
        limit: usize,
        max_radius_km: f64,
        snapshot: &[Driver],
        now: DateTime<Utc>,
    ) -> Vec<DriverCandidate> {
        let mut candidates: Vec<DriverCandidate> = snapshot
            .iter()
            .filter(|d| d.is_eligible_for(vehicle_type, now))
            .filter(|d| !exclude_driver_ids.contains(&d.id))
            .map(|d| DriverCandidate {
                distance_from_user_km: haversine_km(pickup, &d.location()),
                driver: d.clone(),
            })
            .filter(|c| c.distance_from_user_km <= max_radius_km)
            .collect();

        candidates.sort_by(|a, b| {
            a.distance_from_user_km
                .partial_cmp(&b.distance_from_user_km)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.driver
                        .rating
                        .partial_cmp(&a.driver.rating)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| b.driver.completed_trips.cmp(&a.driver.completed_trips))
                .then_with(|| a.driver.id.cmp(&b.driver.id))
        });

        candidates.truncate(limit);
        candidates
    }
}
