use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::trip_controller::TripController;
use crate::models::auth::AuthUser;
use crate::models::trip::{EndTripRequest, StartTripRequest, TripFilters, TripResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(start_trip))
        .route("/:id", put(end_trip))
}

async fn start_trip(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<StartTripRequest>,
) -> Result<Json<TripResponse>, AppError> {
    let controller = TripController::new(state.pool.clone());
    let response = controller.start(auth, request).await?;
    Ok(Json(response))
}

async fn end_trip(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<EndTripRequest>,
) -> Result<Json<TripResponse>, AppError> {
    let controller = TripController::new(state.pool.clone());
    let response = controller.end(auth, id, request).await?;
    Ok(Json(response))
}

async fn list_trips(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filters): Query<TripFilters>,
) -> Result<Json<Vec<TripResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone());
    let response = controller.list(auth, filters).await?;
    Ok(Json(response))
}
