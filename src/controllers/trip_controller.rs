use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::{AuthUser, Role};
use crate::models::trip::{EndTripRequest, StartTripRequest, TripFilters, TripResponse};
use crate::repositories::trip_repository::TripRepository;
use crate::services::trip_lifecycle_service::TripLifecycleService;
use crate::utils::errors::AppError;

pub struct TripController {
    lifecycle: TripLifecycleService,
    repository: TripRepository,
}

impl TripController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            lifecycle: TripLifecycleService::new(pool.clone()),
            repository: TripRepository::new(pool),
        }
    }

    pub async fn start(
        &self,
        auth: AuthUser,
        request: StartTripRequest,
    ) -> Result<TripResponse, AppError> {
        auth.require_driver()?;
        request.validate()?;

        self.lifecycle
            .start_trip(auth.user_id, request.vehicle_id, request.start_km)
            .await
    }

    pub async fn end(
        &self,
        auth: AuthUser,
        trip_id: Uuid,
        request: EndTripRequest,
    ) -> Result<TripResponse, AppError> {
        auth.require_driver()?;
        request.validate()?;

        self.lifecycle
            .end_trip(auth.user_id, trip_id, request.end_km)
            .await
    }

    pub async fn list(
        &self,
        auth: AuthUser,
        filters: TripFilters,
    ) -> Result<Vec<TripResponse>, AppError> {
        // Un driver sólo ve sus propios viajes; el filtro driver_id es de admin
        let driver_id = match auth.role {
            Role::Driver => Some(auth.user_id),
            Role::Admin => filters.driver_id,
        };

        self.repository
            .list_responses(driver_id, filters.vehicle_id)
            .await
    }
}
