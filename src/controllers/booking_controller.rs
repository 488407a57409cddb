//! Controller de bookings: valida requests y delega en la máquina de estados

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::{
    AcceptBookingRequest, BookingResponse, CancelBookingRequest, CompleteBookingRequest,
    CreateBookingRequest, RejectBookingRequest, VerifyOtpRequest,
};
use crate::dto::ApiResponse;
use crate::models::booking::BookingStatus;
use crate::services::booking_service::BookingService;
use crate::utils::errors::AppError;

pub struct BookingController {
    service: Arc<BookingService>,
}

impl BookingController {
    pub fn new(service: Arc<BookingService>) -> Self {
        Self { service }
    }

    pub async fn create(
        &self,
        request: CreateBookingRequest,
    ) -> Result<ApiResponse<BookingResponse>, AppError> {
        request.validate()?;

        let booking = self.service.create(request).await?;
        let message = match booking.status {
            BookingStatus::Assigned => "Conductor asignado".to_string(),
            // Sin conductor elegible no es un error: el booking queda buscando
            _ => "Buscando conductor cercano".to_string(),
        };

        Ok(ApiResponse::success_with_message(
            BookingResponse::from(&booking),
            message,
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<BookingResponse, AppError> {
        let booking = self.service.get(id).await?;
        Ok(BookingResponse::from(&booking))
    }

    pub async fn accept(
        &self,
        id: Uuid,
        request: AcceptBookingRequest,
    ) -> Result<BookingResponse, AppError> {
        request.validate()?;
        let booking = self.service.accept(id, request.driver_id).await?;
        Ok(BookingResponse::from(&booking))
    }

    pub async fn reject(
        &self,
        id: Uuid,
        request: RejectBookingRequest,
    ) -> Result<BookingResponse, AppError> {
        request.validate()?;
        let booking = self.service.reject(id, request.driver_id).await?;
        Ok(BookingResponse::from(&booking))
    }

    pub async fn start(
        &self,
        id: Uuid,
        request: VerifyOtpRequest,
    ) -> Result<BookingResponse, AppError> {
        request.validate()?;
        let booking = self.service.verify_otp_and_start(id, &request.otp).await?;
        Ok(BookingResponse::from(&booking))
    }

    pub async fn complete(
        &self,
        id: Uuid,
        request: CompleteBookingRequest,
    ) -> Result<BookingResponse, AppError> {
        request.validate()?;
        let booking = self
            .service
            .complete(
                id,
                request.actual_distance_km,
                request.duration_seconds,
                request.waiting_time_seconds,
            )
            .await?;
        Ok(BookingResponse::from(&booking))
    }

    pub async fn cancel(
        &self,
        id: Uuid,
        request: CancelBookingRequest,
    ) -> Result<BookingResponse, AppError> {
        let booking = self.service.cancel(id, request.cancelled_by).await?;
        Ok(BookingResponse::from(&booking))
    }

    pub async fn rematch(&self, id: Uuid) -> Result<BookingResponse, AppError> {
        let booking = self.service.rematch(id).await?;
        Ok(BookingResponse::from(&booking))
    }
}
