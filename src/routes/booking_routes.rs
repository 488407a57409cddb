use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{
    AcceptBookingRequest, BookingResponse, CancelBookingRequest, CompleteBookingRequest,
    CreateBookingRequest, RejectBookingRequest, VerifyOtpRequest,
};
use crate::dto::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/:id", get(get_booking))
        .route("/:id/accept", post(accept_booking))
        .route("/:id/reject", post(reject_booking))
        .route("/:id/start", post(start_ride))
        .route("/:id/complete", post(complete_booking))
        .route("/:id/cancel", post(cancel_booking))
        .route("/:id/rematch", post(rematch_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn accept_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AcceptBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    let response = controller.accept(id, request).await?;
    Ok(Json(response))
}

async fn reject_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    let response = controller.reject(id, request).await?;
    Ok(Json(response))
}

async fn start_ride(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    let response = controller.start(id, request).await?;
    Ok(Json(response))
}

async fn complete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    let response = controller.complete(id, request).await?;
    Ok(Json(response))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    let response = controller.cancel(id, request).await?;
    Ok(Json(response))
}

async fn rematch_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    let response = controller.rematch(id).await?;
    Ok(Json(response))
}
