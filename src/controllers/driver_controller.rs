//! Controller de conductores: registro, disponibilidad y consultas cercanas

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::driver_dto::{
    DriverResponse, NearbyDriverResponse, NearbyDriversQuery, RegisterDriverRequest,
    SetOnlineRequest, UpdateLocationRequest,
};
use crate::dto::ApiResponse;
use crate::models::booking::GeoPoint;
use crate::models::driver::Driver;
use crate::repositories::DriverDirectory;
use crate::services::geo_matcher::{GeoMatcher, DEFAULT_MATCH_LIMIT, DEFAULT_MAX_RADIUS_KM};
use crate::utils::errors::{bad_request_error, not_found_error, AppError};
use crate::utils::validation::validate_coordinates;

pub struct DriverController {
    directory: Arc<dyn DriverDirectory>,
}

impl DriverController {
    pub fn new(directory: Arc<dyn DriverDirectory>) -> Self {
        Self { directory }
    }

    pub async fn register(
        &self,
        request: RegisterDriverRequest,
    ) -> Result<ApiResponse<DriverResponse>, AppError> {
        request.validate()?;

        let driver = Driver {
            id: Uuid::new_v4(),
            name: request.name,
            phone: request.phone,
            lat: request.lat,
            lng: request.lng,
            is_online: false,
            busy_until: None,
            vehicle_type: request.vehicle_type,
            base_fare: request.base_fare,
            per_km_rate: request.per_km_rate,
            waiting_charge_per_minute: request.waiting_charge_per_minute,
            minimum_fare: request.minimum_fare,
            rating: 5.0,
            completed_trips: 0,
            updated_at: Utc::now(),
        };

        let created = self.directory.register(driver).await?;
        Ok(ApiResponse::success_with_message(
            DriverResponse::from(&created),
            "Conductor registrado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<DriverResponse, AppError> {
        let driver = self
            .directory
            .get_driver(id)
            .await?
            .ok_or_else(|| not_found_error("Driver", &id.to_string()))?;
        Ok(DriverResponse::from(&driver))
    }

    pub async fn update_location(
        &self,
        id: Uuid,
        request: UpdateLocationRequest,
    ) -> Result<ApiResponse<()>, AppError> {
        request.validate()?;
        self.directory
            .update_location(id, GeoPoint::new(request.lat, request.lng))
            .await?;
        Ok(ApiResponse::success(()))
    }

    pub async fn set_online(
        &self,
        id: Uuid,
        request: SetOnlineRequest,
    ) -> Result<ApiResponse<()>, AppError> {
        self.directory.set_online(id, request.is_online).await?;
        Ok(ApiResponse::success(()))
    }

    /// Consulta de conductores elegibles alrededor de un punto, con la
    /// distancia ya computada (mismo matcher que usa la asignación)
    pub async fn nearby(
        &self,
        query: NearbyDriversQuery,
    ) -> Result<Vec<NearbyDriverResponse>, AppError> {
        let point = GeoPoint::new(query.lat, query.lng);
        validate_coordinates(&point).map_err(|_| bad_request_error("coordinates out of range"))?;

        let radius_km = query.radius_km.unwrap_or(DEFAULT_MAX_RADIUS_KM);
        let limit = query.limit.unwrap_or(DEFAULT_MATCH_LIMIT);

        let snapshot = self.directory.query_nearby(point.clone(), radius_km).await?;
        let candidates = GeoMatcher::find_nearest(
            &point,
            query.vehicle_type,
            &HashSet::new(),
            limit,
            radius_km,
            &snapshot,
            Utc::now(),
        );

        Ok(candidates.iter().map(NearbyDriverResponse::from).collect())
    }
}
