use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::AuthUser;
use crate::models::vehicle::{
    CreateVehicleRequest, UpdateVehicleRequest, Vehicle, VehicleResponse, VehicleStatus,
};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{not_found_error, AppError, LifecycleError};
use crate::utils::validation;

pub struct VehicleController {
    repository: VehicleRepository,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        auth: AuthUser,
        request: CreateVehicleRequest,
    ) -> Result<VehicleResponse, AppError> {
        auth.require_admin()?;
        request.validate()?;
        validation::validate_vehicle_no(&request.vehicle_no)
            .map_err(|e| AppError::BadRequest(format!("Invalid vehicle number: {}", e)))?;
        validation::validate_non_negative(request.current_km)
            .map_err(|_| AppError::BadRequest("Current KM cannot be negative".to_string()))?;

        let vehicle = self
            .repository
            .create(request.vehicle_no, request.current_km)
            .await?;

        Ok(vehicle.into())
    }

    pub async fn list(&self, _auth: AuthUser) -> Result<Vec<VehicleResponse>, AppError> {
        // Drivers y admins ven la flota completa
        let vehicles = self.repository.list().await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    pub async fn get_by_id(&self, _auth: AuthUser, id: Uuid) -> Result<VehicleResponse, AppError> {
        let vehicle = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        Ok(vehicle.into())
    }

    pub async fn update(
        &self,
        auth: AuthUser,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<VehicleResponse, AppError> {
        auth.require_admin()?;
        request.validate()?;

        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        validate_admin_update(&current, &request)?;

        let vehicle = self
            .repository
            .update_admin(id, request.vehicle_no, request.current_km, request.status)
            .await?;

        Ok(vehicle.into())
    }

    pub async fn delete(&self, auth: AuthUser, id: Uuid) -> Result<(), AppError> {
        auth.require_admin()?;

        // Guardia de integridad referencial: la historia de viajes es permanente
        if self.repository.trip_count(id).await? > 0 {
            return Err(AppError::Conflict(
                "Cannot delete vehicle with existing trips".to_string(),
            ));
        }

        self.repository.delete(id).await
    }
}

/// Validar una edición administrativa contra el estado actual del vehículo
///
/// status RUNNING es del coordinador: ningún valor de status que lo ponga
/// o lo quite entra por aquí. current_km tampoco retrocede por admin.
fn validate_admin_update(
    current: &Vehicle,
    request: &UpdateVehicleRequest,
) -> Result<(), AppError> {
    // Una edición administrativa no puede contradecir un viaje activo
    if current.status == VehicleStatus::Running
        && (request.current_km.is_some() || request.status.is_some())
    {
        return Err(AppError::Conflict(
            "Cannot edit status or KM of a vehicle with a running trip".to_string(),
        ));
    }

    // RUNNING lo pone únicamente el coordinador al iniciar un viaje; un
    // vehículo RUNNING sin viaje activo quedaría bloqueado para siempre
    if request.status == Some(VehicleStatus::Running) {
        return Err(AppError::Conflict(
            "Vehicle status RUNNING can only be set by starting a trip".to_string(),
        ));
    }

    if let Some(new_km) = request.current_km {
        validation::validate_non_negative(new_km)
            .map_err(|_| AppError::BadRequest("Current KM cannot be negative".to_string()))?;
        // El odómetro nunca retrocede, tampoco por edición de admin
        if new_km < current.current_km {
            return Err(LifecycleError::KmRegression {
                new_km,
                current_km: current.current_km,
            }
            .into());
        }
    }

    if let Some(ref vehicle_no) = request.vehicle_no {
        validation::validate_vehicle_no(vehicle_no)
            .map_err(|e| AppError::BadRequest(format!("Invalid vehicle number: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

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

    fn update_request(
        vehicle_no: Option<&str>,
        current_km: Option<&str>,
        status: Option<VehicleStatus>,
    ) -> UpdateVehicleRequest {
        UpdateVehicleRequest {
            vehicle_no: vehicle_no.map(String::from),
            current_km: current_km.map(|v| km(v)),
            status,
        }
    }

    #[test]
    fn test_admin_cannot_set_running_on_available_vehicle() {
        // Poner RUNNING a mano dejaría el vehículo ocupado sin ningún
        // viaje activo que lo libere
        let vehicle = test_vehicle("15000", VehicleStatus::Available);
        let request = update_request(None, None, Some(VehicleStatus::Running));

        let err = validate_admin_update(&vehicle, &request).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_admin_cannot_touch_running_vehicle_state() {
        let vehicle = test_vehicle("15000", VehicleStatus::Running);

        let err = validate_admin_update(
            &vehicle,
            &update_request(None, None, Some(VehicleStatus::Available)),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = validate_admin_update(&vehicle, &update_request(None, Some("16000"), None))
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_admin_can_rename_running_vehicle() {
        // La matrícula no es estado del ciclo de vida
        let vehicle = test_vehicle("15000", VehicleStatus::Running);
        let request = update_request(Some("CAR-002"), None, None);

        assert!(validate_admin_update(&vehicle, &request).is_ok());
    }

    #[test]
    fn test_admin_update_rejects_km_regression() {
        let vehicle = test_vehicle("15000", VehicleStatus::Available);
        let request = update_request(None, Some("14000"), None);

        let err = validate_admin_update(&vehicle, &request).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_admin_update_allows_forward_km_and_noop_status() {
        let vehicle = test_vehicle("15000", VehicleStatus::Available);
        let request = update_request(
            Some("CAR-002"),
            Some("15500"),
            Some(VehicleStatus::Available),
        );

        assert!(validate_admin_update(&vehicle, &request).is_ok());
    }
}
