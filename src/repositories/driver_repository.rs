//! Implementación PostgreSQL del directorio de conductores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::booking::GeoPoint;
use crate::models::driver::Driver;
use crate::repositories::DriverDirectory;
use crate::utils::errors::AppError;

/// Grados de latitud por kilómetro (aprox. 111 km por grado)
const KM_PER_DEGREE_LAT: f64 = 111.0;

pub struct PgDriverDirectory {
    pool: PgPool,
}

impl PgDriverDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverDirectory for PgDriverDirectory {
    async fn register(&self, driver: Driver) -> Result<Driver, AppError> {
        let created = sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (
                id, name, phone, lat, lng, is_online, busy_until, vehicle_type,
                base_fare, per_km_rate, waiting_charge_per_minute, minimum_fare,
                rating, completed_trips, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(driver.id)
        .bind(driver.name)
        .bind(driver.phone)
        .bind(driver.lat)
        .bind(driver.lng)
        .bind(driver.is_online)
        .bind(driver.busy_until)
        .bind(driver.vehicle_type)
        .bind(driver.base_fare)
        .bind(driver.per_km_rate)
        .bind(driver.waiting_charge_per_minute)
        .bind(driver.minimum_fare)
        .bind(driver.rating)
        .bind(driver.completed_trips)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn query_nearby(&self, point: GeoPoint, radius_km: f64) -> Result<Vec<Driver>, AppError> {
        // Prefiltro por bounding box; el haversine fino lo aplica el GeoMatcher
        let dlat = radius_km / KM_PER_DEGREE_LAT;
        let dlng = radius_km / (KM_PER_DEGREE_LAT * point.lat.to_radians().cos().abs().max(0.01));

        let drivers = sqlx::query_as::<_, Driver>(
            r#"
            SELECT * FROM drivers
            WHERE is_online = TRUE
              AND lat BETWEEN $1 AND $2
              AND lng BETWEEN $3 AND $4
            "#,
        )
        .bind(point.lat - dlat)
        .bind(point.lat + dlat)
        .bind(point.lng - dlng)
        .bind(point.lng + dlng)
        .fetch_all(&self.pool)
        .await?;

        Ok(drivers)
    }

    async fn get_driver(&self, id: Uuid) -> Result<Option<Driver>, AppError> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(driver)
    }

    async fn set_busy_until(
        &self,
        id: Uuid,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE drivers SET busy_until = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(until)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_online(&self, id: Uuid, online: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE drivers SET is_online = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(online)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_location(&self, id: Uuid, point: GeoPoint) -> Result<(), AppError> {
        sqlx::query("UPDATE drivers SET lat = $2, lng = $3, updated_at = $4 WHERE id = $1")
            .bind(id)
            .bind(point.lat)
            .bind(point.lng)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_completed_trip(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE drivers SET completed_trips = completed_trips + 1, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
