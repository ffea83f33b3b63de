//! Modelo de Trip
//!
//! Este módulo contiene el struct Trip, su máquina de estados
//! (RUNNING → COMPLETED, estado terminal único) y sus DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::VehicleSummary;
use crate::utils::errors::LifecycleError;
use crate::utils::validation;

/// Estado del viaje - mapea al ENUM trip_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "trip_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TripStatus {
    Running,
    Completed,
}

/// Trip principal - mapea exactamente a la tabla trips
///
/// `end_km`, `distance` y `end_time` están presentes si y solo si el
/// viaje está COMPLETED. La historia de viajes es permanente: el core
/// nunca borra un Trip.
#[derive(Debug, Clone, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub start_km: Decimal,
    pub end_km: Option<Decimal>,
    pub distance: Option<Decimal>,
    pub status: TripStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Trip {
    /// Abrir un viaje en estado RUNNING
    ///
    /// El coordinador garantiza antes de llamar que el driver no tiene
    /// otro viaje activo.
    pub fn open(driver_id: Uuid, vehicle_id: Uuid, start_km: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_id,
            vehicle_id,
            start_km,
            end_km: None,
            distance: None,
            status: TripStatus::Running,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    /// Transición RUNNING → COMPLETED, exactamente una vez
    ///
    /// La segunda llamada es un error, no un no-op: no hay idempotencia
    /// ni reapertura.
    pub fn close(&mut self, end_km: Decimal) -> Result<(), LifecycleError> {
        validation::validate_end(end_km, self.start_km, self.status)?;

        self.end_km = Some(end_km);
        self.distance = Some(validation::compute_distance(self.start_km, end_km));
        self.status = TripStatus::Completed;
        self.end_time = Some(Utc::now());
        Ok(())
    }
}

/// Request para iniciar un viaje (solo driver)
#[derive(Debug, Deserialize, Validate)]
pub struct StartTripRequest {
    pub vehicle_id: Uuid,
    pub start_km: Decimal,
}

/// Request para terminar un viaje
#[derive(Debug, Deserialize, Validate)]
pub struct EndTripRequest {
    pub end_km: Decimal,
}

/// Filtros para listado de viajes
#[derive(Debug, Deserialize)]
pub struct TripFilters {
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}

/// Resumen de driver para respuestas de viaje
#[derive(Debug, Clone, Serialize)]
pub struct DriverSummary {
    pub id: Uuid,
    pub name: String,
    pub username: String,
}

/// Response de viaje con driver y vehículo embebidos
#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: Uuid,
    pub driver: DriverSummary,
    pub vehicle: VehicleSummary,
    pub start_km: Decimal,
    pub end_km: Option<Decimal>,
    pub distance: Option<Decimal>,
    pub status: TripStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}
