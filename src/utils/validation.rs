//! Utilidades de validación
//!
//! Este módulo contiene el validador de odómetro (funciones puras, sin
//! efectos secundarios) y helpers genéricos de validación de datos.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use validator::ValidationError;

use crate::models::trip::TripStatus;
use crate::models::vehicle::VehicleStatus;
use crate::utils::errors::LifecycleError;

/// Validar el inicio de un viaje contra el estado actual del vehículo
///
/// Orden de los chequeos: disponibilidad del vehículo, monotonía del
/// odómetro, sanidad del valor. El primero que falla corta.
pub fn validate_start(
    start_km: Decimal,
    vehicle_current_km: Decimal,
    vehicle_status: VehicleStatus,
) -> Result<(), LifecycleError> {
    if vehicle_status != VehicleStatus::Available {
        return Err(LifecycleError::VehicleNotAvailable);
    }

    if start_km < vehicle_current_km {
        return Err(LifecycleError::StartKmBelowCurrent {
            start_km,
            current_km: vehicle_current_km,
        });
    }

    if start_km < Decimal::ZERO {
        return Err(LifecycleError::NegativeKm);
    }

    Ok(())
}

/// Validar el fin de un viaje contra su lectura inicial y su estado
pub fn validate_end(
    end_km: Decimal,
    start_km: Decimal,
    trip_status: TripStatus,
) -> Result<(), LifecycleError> {
    if trip_status != TripStatus::Running {
        return Err(LifecycleError::TripNotRunning);
    }

    if end_km < start_km {
        return Err(LifecycleError::EndKmBelowStart { end_km, start_km });
    }

    if end_km < Decimal::ZERO {
        return Err(LifecycleError::NegativeKm);
    }

    Ok(())
}

/// Calcular la distancia recorrida, redondeada a 2 decimales
///
/// Redondeo midpoint-away-from-zero, reproducible sobre Decimal: sin
/// tolerancias de punto flotante.
pub fn compute_distance(start_km: Decimal, end_km: Decimal) -> Decimal {
    (end_km - start_km).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar formato de número de vehículo (tag legible, ej. CAR-001)
pub fn validate_vehicle_no(value: &str) -> Result<(), ValidationError> {
    let clean = value.replace([' ', '-', '_'], "");
    if clean.len() < 3 || clean.len() > 20 {
        let mut error = ValidationError::new("vehicle_no");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn km(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_validate_start_ok_at_current_km() {
        // Vehículo en 15000, arranque exacto en 15000
        assert!(validate_start(km("15000"), km("15000"), VehicleStatus::Available).is_ok());
        assert!(validate_start(km("15000.5"), km("15000"), VehicleStatus::Available).is_ok());
    }

    #[test]
    fn test_validate_start_below_current_km() {
        let err = validate_start(km("14000"), km("15000"), VehicleStatus::Available).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::StartKmBelowCurrent {
                start_km: km("14000"),
                current_km: km("15000"),
            }
        );
    }

    #[test]
    fn test_validate_start_vehicle_not_available() {
        let err = validate_start(km("15000"), km("15000"), VehicleStatus::Running).unwrap_err();
        assert_eq!(err, LifecycleError::VehicleNotAvailable);
    }

    #[test]
    fn test_validate_start_availability_checked_first() {
        // Con el vehículo ocupado, el KM regresivo no se reporta
        let err = validate_start(km("14000"), km("15000"), VehicleStatus::Running).unwrap_err();
        assert_eq!(err, LifecycleError::VehicleNotAvailable);
    }

    #[test]
    fn test_validate_start_negative_km() {
        let err = validate_start(km("-1"), km("-5"), VehicleStatus::Available).unwrap_err();
        assert_eq!(err, LifecycleError::NegativeKm);
    }

    #[test]
    fn test_validate_end_ok() {
        assert!(validate_end(km("15120"), km("15000"), TripStatus::Running).is_ok());
        // Distancia cero es válida
        assert!(validate_end(km("15000"), km("15000"), TripStatus::Running).is_ok());
    }

    #[test]
    fn test_validate_end_below_start() {
        let err = validate_end(km("14900"), km("15000"), TripStatus::Running).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::EndKmBelowStart {
                end_km: km("14900"),
                start_km: km("15000"),
            }
        );
    }

    #[test]
    fn test_validate_end_trip_not_running() {
        let err = validate_end(km("15120"), km("15000"), TripStatus::Completed).unwrap_err();
        assert_eq!(err, LifecycleError::TripNotRunning);
    }

    #[test]
    fn test_validate_end_negative_km() {
        let err = validate_end(km("-10"), km("-20"), TripStatus::Running).unwrap_err();
        assert_eq!(err, LifecycleError::NegativeKm);
    }

    #[test]
    fn test_compute_distance_two_decimals() {
        assert_eq!(compute_distance(km("15000"), km("15120")), km("120"));
        assert_eq!(compute_distance(km("100.111"), km("200.222")), km("100.11"));
        assert_eq!(compute_distance(km("0"), km("0.005")), km("0.01"));
    }

    #[test]
    fn test_compute_distance_zero_when_equal() {
        assert_eq!(compute_distance(km("15000"), km("15000")), Decimal::ZERO);
    }

    #[test]
    fn test_compute_distance_exact_rounding_reproducible() {
        // Caso clásico que rompe con f64: 0.1 + 0.2
        let a = km("0.1");
        let b = km("0.3");
        assert_eq!(compute_distance(a, b), km("0.2"));
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(km("0")).is_ok());
        assert!(validate_non_negative(km("15000")).is_ok());
        assert!(validate_non_negative(km("-0.01")).is_err());
    }

    #[test]
    fn test_validate_vehicle_no() {
        assert!(validate_vehicle_no("CAR-001").is_ok());
        assert!(validate_vehicle_no("AB").is_err());
        assert!(validate_vehicle_no(&"X".repeat(25)).is_err());
    }
}
