//! Coordinador del ciclo de vida viaje/vehículo
//!
//! Único componente con responsabilidad transaccional entre entidades.
//! `start_trip` y `end_trip` ejecutan lectura-chequeo-escritura como una
//! sola transacción SERIALIZABLE con lock de fila: o se aplica todo
//! (viaje + estado del vehículo) o no se aplica nada.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::trip::{Trip, TripResponse};
use crate::repositories::trip_repository::TripRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{is_serialization_failure, AppError, LifecycleError};
use crate::utils::validation;

/// Reintentos automáticos ante fallo de serialización (SQLSTATE 40001)
const MAX_SERIALIZATION_RETRIES: u32 = 3;

pub struct TripLifecycleService {
    pool: PgPool,
    trips: TripRepository,
}

impl TripLifecycleService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            trips: TripRepository::new(pool.clone()),
            pool,
        }
    }

    /// Iniciar un viaje: crea el Trip en RUNNING y ocupa el vehículo
    pub async fn start_trip(
        &self,
        driver_id: Uuid,
        vehicle_id: Uuid,
        start_km: Decimal,
    ) -> Result<TripResponse, AppError> {
        let mut attempt = 0;
        loop {
            match self.try_start_trip(driver_id, vehicle_id, start_km).await {
                Err(AppError::Database(e)) if is_serialization_failure(&e) => {
                    attempt += 1;
                    if attempt > MAX_SERIALIZATION_RETRIES {
                        return Err(LifecycleError::SerializationConflict.into());
                    }
                    tracing::warn!(
                        "Conflicto de serialización iniciando viaje (intento {}/{}), reintentando",
                        attempt,
                        MAX_SERIALIZATION_RETRIES
                    );
                }
                other => return other,
            }
        }
    }

    /// Terminar un viaje: lo completa y libera el vehículo avanzando el odómetro
    pub async fn end_trip(
        &self,
        driver_id: Uuid,
        trip_id: Uuid,
        end_km: Decimal,
    ) -> Result<TripResponse, AppError> {
        let mut attempt = 0;
        loop {
            match self.try_end_trip(driver_id, trip_id, end_km).await {
                Err(AppError::Database(e)) if is_serialization_failure(&e) => {
                    attempt += 1;
                    if attempt > MAX_SERIALIZATION_RETRIES {
                        return Err(LifecycleError::SerializationConflict.into());
                    }
                    tracing::warn!(
                        "Conflicto de serialización terminando viaje (intento {}/{}), reintentando",
                        attempt,
                        MAX_SERIALIZATION_RETRIES
                    );
                }
                other => return other,
            }
        }
    }

    async fn try_start_trip(
        &self,
        driver_id: Uuid,
        vehicle_id: Uuid,
        start_km: Decimal,
    ) -> Result<TripResponse, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        // El lock de fila serializa dos starts sobre el mismo vehículo:
        // el segundo verá status RUNNING y fallará en la validación.
        let mut vehicle = VehicleRepository::find_by_id_for_update(&mut tx, vehicle_id)
            .await?
            .ok_or(LifecycleError::VehicleNotFound)?;

        validation::validate_start(start_km, vehicle.current_km, vehicle.status)?;

        // Invariante global: a lo sumo un viaje RUNNING por driver
        if TripRepository::driver_has_running_trip(&mut tx, driver_id).await? {
            return Err(LifecycleError::DriverAlreadyOnTrip.into());
        }

        let trip = Trip::open(driver_id, vehicle_id, start_km);
        TripRepository::insert(&mut tx, &trip).await?;

        vehicle.mark_running()?;
        VehicleRepository::persist_transition(&mut tx, &vehicle).await?;

        tx.commit().await?;

        tracing::info!(
            "Viaje {} iniciado: driver {}, vehículo {}, start_km {}",
            trip.id,
            driver_id,
            vehicle_id,
            start_km
        );

        self.trips
            .find_response_by_id(trip.id)
            .await?
            .ok_or_else(|| AppError::Internal("Trip missing after commit".to_string()))
    }

    async fn try_end_trip(
        &self,
        driver_id: Uuid,
        trip_id: Uuid,
        end_km: Decimal,
    ) -> Result<TripResponse, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let mut trip = TripRepository::find_by_id_for_update(&mut tx, trip_id)
            .await?
            .ok_or(LifecycleError::TripNotFound)?;

        // Un driver sólo puede terminar su propio viaje
        if trip.driver_id != driver_id {
            return Err(LifecycleError::Forbidden.into());
        }

        trip.close(end_km)?;

        let mut vehicle = VehicleRepository::find_by_id_for_update(&mut tx, trip.vehicle_id)
            .await?
            .ok_or(LifecycleError::VehicleNotFound)?;
        vehicle.mark_available(end_km)?;

        TripRepository::persist_close(&mut tx, &trip).await?;
        VehicleRepository::persist_transition(&mut tx, &vehicle).await?;

        tx.commit().await?;

        tracing::info!(
            "Viaje {} completado: distancia {}, vehículo {} en {}",
            trip.id,
            trip.distance.unwrap_or_default(),
            vehicle.id,
            vehicle.current_km
        );

        self.trips
            .find_response_by_id(trip.id)
            .await?
            .ok_or_else(|| AppError::Internal("Trip missing after commit".to_string()))
    }
}

#[cfg(test)]
mod tests {
    //! Simulación en memoria del protocolo del coordinador sobre los
    //! modelos puros: mismo orden de pasos que las transacciones reales.

    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::models::trip::{Trip, TripStatus};
    use crate::models::vehicle::{Vehicle, VehicleStatus};
    use crate::utils::errors::LifecycleError;
    use crate::utils::validation;

    fn km(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn vehicle_available(current_km: &str) -> Vehicle {
        let now = Utc::now();
        Vehicle {
            id: Uuid::new_v4(),
            vehicle_no: "CAR-001".to_string(),
            current_km: km(current_km),
            status: VehicleStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }

    /// Réplica del orden de pasos de try_start_trip
    fn start_trip(
        driver_id: Uuid,
        vehicle: &mut Vehicle,
        start_km: Decimal,
        driver_has_running_trip: bool,
    ) -> Result<Trip, LifecycleError> {
        validation::validate_start(start_km, vehicle.current_km, vehicle.status)?;
        if driver_has_running_trip {
            return Err(LifecycleError::DriverAlreadyOnTrip);
        }
        let trip = Trip::open(driver_id, vehicle.id, start_km);
        vehicle.mark_running()?;
        Ok(trip)
    }

    /// Réplica del orden de pasos de try_end_trip
    fn end_trip(
        driver_id: Uuid,
        trip: &mut Trip,
        vehicle: &mut Vehicle,
        end_km: Decimal,
    ) -> Result<(), LifecycleError> {
        if trip.driver_id != driver_id {
            return Err(LifecycleError::Forbidden);
        }
        trip.close(end_km)?;
        vehicle.mark_available(end_km)?;
        Ok(())
    }

    #[test]
    fn test_start_trip_happy_path() {
        // V1 en 15000 AVAILABLE; start en 15000 → viaje RUNNING, vehículo RUNNING
        let driver = Uuid::new_v4();
        let mut vehicle = vehicle_available("15000");

        let trip = start_trip(driver, &mut vehicle, km("15000"), false).unwrap();

        assert_eq!(trip.status, TripStatus::Running);
        assert_eq!(vehicle.status, VehicleStatus::Running);
    }

    #[test]
    fn test_start_trip_below_current_km() {
        let driver = Uuid::new_v4();
        let mut vehicle = vehicle_available("15000");

        let err = start_trip(driver, &mut vehicle, km("14000"), false).unwrap_err();

        assert!(matches!(err, LifecycleError::StartKmBelowCurrent { .. }));
        // Sin efecto parcial
        assert_eq!(vehicle.status, VehicleStatus::Available);
    }

    #[test]
    fn test_start_trip_driver_already_on_trip() {
        let driver = Uuid::new_v4();
        let mut v1 = vehicle_available("15000");
        let mut v2 = vehicle_available("0");

        start_trip(driver, &mut v1, km("15000"), false).unwrap();

        // El mismo driver intenta un segundo viaje en otro vehículo
        let err = start_trip(driver, &mut v2, km("0"), true).unwrap_err();
        assert_eq!(err, LifecycleError::DriverAlreadyOnTrip);
        assert_eq!(v2.status, VehicleStatus::Available);
    }

    #[test]
    fn test_end_trip_happy_path() {
        let driver = Uuid::new_v4();
        let mut vehicle = vehicle_available("15000");
        let mut trip = start_trip(driver, &mut vehicle, km("15000"), false).unwrap();

        end_trip(driver, &mut trip, &mut vehicle, km("15120")).unwrap();

        assert_eq!(trip.status, TripStatus::Completed);
        assert_eq!(trip.distance, Some(km("120.00")));
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert_eq!(vehicle.current_km, km("15120"));
    }

    #[test]
    fn test_end_trip_twice_fails() {
        let driver = Uuid::new_v4();
        let mut vehicle = vehicle_available("15000");
        let mut trip = start_trip(driver, &mut vehicle, km("15000"), false).unwrap();
        end_trip(driver, &mut trip, &mut vehicle, km("15120")).unwrap();

        let err = end_trip(driver, &mut trip, &mut vehicle, km("15200")).unwrap_err();
        assert_eq!(err, LifecycleError::TripNotRunning);
        // El primer cierre queda intacto
        assert_eq!(trip.end_km, Some(km("15120")));
        assert_eq!(vehicle.current_km, km("15120"));
    }

    #[test]
    fn test_end_trip_foreign_driver_forbidden() {
        let driver = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let mut vehicle = vehicle_available("15000");
        let mut trip = start_trip(driver, &mut vehicle, km("15000"), false).unwrap();

        let err = end_trip(intruder, &mut trip, &mut vehicle, km("15120")).unwrap_err();
        assert_eq!(err, LifecycleError::Forbidden);
        assert_eq!(trip.status, TripStatus::Running);
        assert_eq!(vehicle.status, VehicleStatus::Running);
    }

    #[test]
    fn test_concurrent_starts_same_vehicle() {
        // Dos starts sobre el mismo vehículo: ambos lo vieron AVAILABLE,
        // pero el lock de fila serializa y el segundo falla.
        let d1 = Uuid::new_v4();
        let d2 = Uuid::new_v4();
        let mut vehicle = vehicle_available("15000");

        assert!(start_trip(d1, &mut vehicle, km("15000"), false).is_ok());

        let err = start_trip(d2, &mut vehicle, km("15000"), false).unwrap_err();
        assert_eq!(err, LifecycleError::VehicleNotAvailable);
    }

    #[test]
    fn test_running_vehicle_has_exactly_one_running_trip() {
        let driver = Uuid::new_v4();
        let mut vehicle = vehicle_available("15000");
        let mut trip = start_trip(driver, &mut vehicle, km("15000"), false).unwrap();

        // status RUNNING ⇔ un viaje RUNNING lo referencia
        assert_eq!(vehicle.status, VehicleStatus::Running);
        assert_eq!(trip.vehicle_id, vehicle.id);
        assert_eq!(trip.status, TripStatus::Running);

        end_trip(driver, &mut trip, &mut vehicle, km("15050")).unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert_eq!(trip.status, TripStatus::Completed);
    }
}
