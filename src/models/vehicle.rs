//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, su máquina de estados
//! (AVAILABLE ⇄ RUNNING) y sus DTOs. Mapea exactamente a la tabla
//! vehicles del schema PostgreSQL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

use crate::utils::errors::LifecycleError;

/// Estado del vehículo - mapea al ENUM vehicle_status
///
/// Dos estados, dos aristas: AVAILABLE→RUNNING al iniciar viaje,
/// RUNNING→AVAILABLE al terminarlo. Sin self-loops ni otros estados.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleStatus {
    Available,
    Running,
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub vehicle_no: String,
    pub current_km: Decimal,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Transición AVAILABLE → RUNNING al iniciar un viaje
    ///
    /// Falla si el vehículo no está disponible: así se detecta la carrera
    /// de dos starts simultáneos sobre el mismo vehículo.
    pub fn mark_running(&mut self) -> Result<(), LifecycleError> {
        if self.status != VehicleStatus::Available {
            return Err(LifecycleError::VehicleNotAvailable);
        }
        self.status = VehicleStatus::Running;
        Ok(())
    }

    /// Transición RUNNING → AVAILABLE al terminar un viaje
    ///
    /// Avanza el odómetro a `new_current_km`. El chequeo de regresión es
    /// inalcanzable con la validación upstream, pero el invariante se
    /// verifica igual.
    pub fn mark_available(&mut self, new_current_km: Decimal) -> Result<(), LifecycleError> {
        if self.status != VehicleStatus::Running {
            return Err(LifecycleError::VehicleNotAvailable);
        }
        if new_current_km < self.current_km {
            return Err(LifecycleError::KmRegression {
                new_km: new_current_km,
                current_km: self.current_km,
            });
        }
        self.status = VehicleStatus::Available;
        self.current_km = new_current_km;
        Ok(())
    }
}

/// Request para crear un nuevo vehículo (solo admin)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 3, max = 20))]
    pub vehicle_no: String,

    pub current_km: Decimal,
}

/// Request para actualizar un vehículo existente
///
/// Campos opcionales explícitos; `status`/`current_km` se rechazan si el
/// vehículo tiene un viaje activo (ver VehicleController).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 3, max = 20))]
    pub vehicle_no: Option<String>,

    pub current_km: Option<Decimal>,

    pub status: Option<VehicleStatus>,
}

/// Response de vehículo para la API
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub vehicle_no: String,
    pub current_km: Decimal,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resumen de vehículo para respuestas de viaje
#[derive(Debug, Clone, Serialize)]
pub struct VehicleSummary {
    pub id: Uuid,
    pub vehicle_no: String,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            vehicle_no: vehicle.vehicle_no,
            current_km: vehicle.current_km,
            status: vehicle.status,
            created_at: vehicle.created_at,
            updated_at: vehicle.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn km(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn test_vehicle(current_km: &str, status: VehicleStatus) -> Vehicle {
        let now = Utc::now();
        Vehicle {
            id: Uuid::new_v4(),
            vehicle_no: "CAR-001".to_string(),
            current_km: km(current_km),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_mark_running_from_available() {
        let mut vehicle = test_vehicle("15000", VehicleStatus::Available);
        assert!(vehicle.mark_running().is_ok());
        assert_eq!(vehicle.status, VehicleStatus::Running);
    }

    #[test]
    fn test_mark_running_twice_fails() {
        // La carrera de dos starts sobre el mismo vehículo: el segundo
        // mark_running ve RUNNING y falla.
        let mut vehicle = test_vehicle("15000", VehicleStatus::Available);
        vehicle.mark_running().unwrap();

        let err = vehicle.mark_running().unwrap_err();
        assert_eq!(err, LifecycleError::VehicleNotAvailable);
        assert_eq!(vehicle.status, VehicleStatus::Running);
    }

    #[test]
    fn test_mark_available_advances_odometer() {
        let mut vehicle = test_vehicle("15000", VehicleStatus::Running);
        assert!(vehicle.mark_available(km("15120")).is_ok());
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert_eq!(vehicle.current_km, km("15120"));
    }

    #[test]
    fn test_mark_available_rejects_km_regression() {
        let mut vehicle = test_vehicle("15000", VehicleStatus::Running);
        let err = vehicle.mark_available(km("14000")).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::KmRegression {
                new_km: km("14000"),
                current_km: km("15000"),
            }
        );
        // El estado queda intacto tras el fallo
        assert_eq!(vehicle.status, VehicleStatus::Running);
        assert_eq!(vehicle.current_km, km("15000"));
    }

    #[test]
    fn test_mark_available_requires_running() {
        let mut vehicle = test_vehicle("15000", VehicleStatus::Available);
        assert!(vehicle.mark_available(km("15120")).is_err());
    }

    #[test]
    fn test_mark_available_same_km_is_valid() {
        // Viaje de distancia cero: el odómetro no retrocede
        let mut vehicle = test_vehicle("15000", VehicleStatus::Running);
        assert!(vehicle.mark_available(km("15000")).is_ok());
        assert_eq!(vehicle.current_km, km("15000"));
    }
}
