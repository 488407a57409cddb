//! Implementación PostgreSQL del store de bookings

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::repositories::BookingStore;
use crate::utils::errors::{not_found_error, AppError};

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn create(&self, booking: &Booking) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, customer_id, driver_id,
                pickup_lat, pickup_lng, pickup_address,
                dropoff_lat, dropoff_lng, dropoff_address,
                vehicle_type, estimated_distance_km, estimated_fare,
                actual_distance_km, actual_fare, fare_breakdown,
                ride_otp, otp_attempts, status,
                rejection_count, rejected_driver_ids, cancelled_by,
                created_at, booking_time, start_time, end_time
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
            )
            "#,
        )
        .bind(booking.id)
        .bind(booking.customer_id)
        .bind(booking.driver_id)
        .bind(booking.pickup_lat)
        .bind(booking.pickup_lng)
        .bind(&booking.pickup_address)
        .bind(booking.dropoff_lat)
        .bind(booking.dropoff_lng)
        .bind(&booking.dropoff_address)
        .bind(booking.vehicle_type)
        .bind(booking.estimated_distance_km)
        .bind(booking.estimated_fare)
        .bind(booking.actual_distance_km)
        .bind(booking.actual_fare)
        .bind(&booking.fare_breakdown)
        .bind(&booking.ride_otp)
        .bind(booking.otp_attempts)
        .bind(booking.status)
        .bind(booking.rejection_count)
        .bind(&booking.rejected_driver_ids)
        .bind(&booking.cancelled_by)
        .bind(booking.created_at)
        .bind(booking.booking_time)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn update(&self, booking: &Booking) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                driver_id = $2,
                estimated_distance_km = $3,
                estimated_fare = $4,
                actual_distance_km = $5,
                actual_fare = $6,
                fare_breakdown = $7,
                otp_attempts = $8,
                status = $9,
                rejection_count = $10,
                rejected_driver_ids = $11,
                cancelled_by = $12,
                booking_time = $13,
                start_time = $14,
                end_time = $15
            WHERE id = $1
            "#,
        )
        .bind(booking.id)
        .bind(booking.driver_id)
        .bind(booking.estimated_distance_km)
        .bind(booking.estimated_fare)
        .bind(booking.actual_distance_km)
        .bind(booking.actual_fare)
        .bind(&booking.fare_breakdown)
        .bind(booking.otp_attempts)
        .bind(booking.status)
        .bind(booking.rejection_count)
        .bind(&booking.rejected_driver_ids)
        .bind(&booking.cancelled_by)
        .bind(booking.booking_time)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Booking", &booking.id.to_string()));
        }

        Ok(())
    }
}
