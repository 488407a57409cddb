use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::driver_controller::DriverController;
use crate::dto::driver_dto::{
    DriverResponse, NearbyDriverResponse, NearbyDriversQuery, RegisterDriverRequest,
    SetOnlineRequest, UpdateLocationRequest,
};
use crate::dto::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_driver))
        .route("/nearby", get(nearby_drivers))
        .route("/:id", get(get_driver))
        .route("/:id/location", put(update_location))
        .route("/:id/online", put(set_online))
}

async fn register_driver(
    State(state): State<AppState>,
    Json(request): Json<RegisterDriverRequest>,
) -> Result<Json<ApiResponse<DriverResponse>>, AppError> {
    let controller = DriverController::new(state.drivers.clone());
    let response = controller.register(request).await?;
    Ok(Json(response))
}

async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverResponse>, AppError> {
    let controller = DriverController::new(state.drivers.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = DriverController::new(state.drivers.clone());
    let response = controller.update_location(id, request).await?;
    Ok(Json(response))
}

async fn set_online(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetOnlineRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = DriverController::new(state.drivers.clone());
    let response = controller.set_online(id, request).await?;
    Ok(Json(response))
}

async fn nearby_drivers(
    State(state): State<AppState>,
    Query(query): Query<NearbyDriversQuery>,
) -> Result<Json<Vec<NearbyDriverResponse>>, AppError> {
    let controller = DriverController::new(state.drivers.clone());
    let response = controller.nearby(query).await?;
    Ok(Json(response))
}
