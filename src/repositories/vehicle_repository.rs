use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::utils::errors::{conflict_error, is_unique_violation, AppError};

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, vehicle_no: String, current_km: Decimal) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, vehicle_no, current_km, status, created_at, updated_at)
            VALUES ($1, $2, $3, 'AVAILABLE', $4, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&vehicle_no)
        .bind(current_km)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                conflict_error("Vehicle", "vehicle_no", &vehicle_no)
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(vehicle)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    /// Cargar el vehículo con lock de fila, dentro de la transacción del
    /// coordinador. Dos starts concurrentes sobre el mismo vehículo se
    /// serializan aquí.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(vehicle)
    }

    pub async fn list(&self) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles ORDER BY vehicle_no ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(vehicles)
    }

    /// Persistir una transición de estado ya aplicada al modelo
    ///
    /// Único punto de escritura de `status`/`current_km` dentro de las
    /// transacciones del coordinador.
    pub async fn persist_transition(
        conn: &mut PgConnection,
        vehicle: &Vehicle,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE vehicles
            SET status = $2, current_km = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(vehicle.id)
        .bind(vehicle.status)
        .bind(vehicle.current_km)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Actualización administrativa (fuera del ciclo de vida de viajes)
    pub async fn update_admin(
        &self,
        id: Uuid,
        vehicle_no: Option<String>,
        current_km: Option<Decimal>,
        status: Option<VehicleStatus>,
    ) -> Result<Vehicle, AppError> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        let vehicle_no = vehicle_no.unwrap_or(current.vehicle_no);

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET vehicle_no = $2, current_km = $3, status = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&vehicle_no)
        .bind(current_km.unwrap_or(current.current_km))
        .bind(status.unwrap_or(current.status))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                conflict_error("Vehicle", "vehicle_no", &vehicle_no)
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(vehicle)
    }

    pub async fn trip_count(&self, id: Uuid) -> Result<i64, AppError> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trips WHERE vehicle_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vehicle not found".to_string()));
        }

        Ok(())
    }
}
