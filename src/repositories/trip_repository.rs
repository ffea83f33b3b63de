use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::models::trip::{DriverSummary, Trip, TripResponse, TripStatus};
use crate::models::vehicle::VehicleSummary;
use crate::utils::errors::AppError;

/// Fila de viaje con driver y vehículo ya unidos
#[derive(Debug, sqlx::FromRow)]
struct TripJoinedRow {
    id: Uuid,
    driver_id: Uuid,
    vehicle_id: Uuid,
    start_km: Decimal,
    end_km: Option<Decimal>,
    distance: Option<Decimal>,
    status: TripStatus,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    driver_name: String,
    driver_username: String,
    vehicle_no: String,
}

impl From<TripJoinedRow> for TripResponse {
    fn from(row: TripJoinedRow) -> Self {
        Self {
            id: row.id,
            driver: DriverSummary {
                id: row.driver_id,
                name: row.driver_name,
                username: row.driver_username,
            },
            vehicle: VehicleSummary {
                id: row.vehicle_id,
                vehicle_no: row.vehicle_no,
            },
            start_km: row.start_km,
            end_km: row.end_km,
            distance: row.distance,
            status: row.status,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

const JOINED_SELECT: &str = r#"
SELECT t.id, t.driver_id, t.vehicle_id, t.start_km, t.end_km, t.distance,
       t.status, t.start_time, t.end_time,
       u.name AS driver_name, u.username AS driver_username,
       v.vehicle_no
FROM trips t
JOIN users u ON u.id = t.driver_id
JOIN vehicles v ON v.id = t.vehicle_id
"#;

pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insertar un viaje recién abierto, dentro de la transacción del coordinador
    pub async fn insert(conn: &mut PgConnection, trip: &Trip) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO trips (id, driver_id, vehicle_id, start_km, status, start_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(trip.id)
        .bind(trip.driver_id)
        .bind(trip.vehicle_id)
        .bind(trip.start_km)
        .bind(trip.status)
        .bind(trip.start_time)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Cargar el viaje con lock de fila, dentro de la transacción del
    /// coordinador. Dos ends concurrentes sobre el mismo viaje se
    /// serializan aquí.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(trip)
    }

    /// Verificar el invariante global: a lo sumo un viaje RUNNING por driver
    pub async fn driver_has_running_trip(
        conn: &mut PgConnection,
        driver_id: Uuid,
    ) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM trips WHERE driver_id = $1 AND status = 'RUNNING')",
        )
        .bind(driver_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(result.0)
    }

    /// Persistir el cierre de un viaje ya aplicado al modelo
    pub async fn persist_close(conn: &mut PgConnection, trip: &Trip) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE trips
            SET end_km = $2, distance = $3, status = $4, end_time = $5
            WHERE id = $1
            "#,
        )
        .bind(trip.id)
        .bind(trip.end_km)
        .bind(trip.distance)
        .bind(trip.status)
        .bind(trip.end_time)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Obtener un viaje con driver y vehículo embebidos
    pub async fn find_response_by_id(&self, id: Uuid) -> Result<Option<TripResponse>, AppError> {
        let mut query: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(JOINED_SELECT);
        query.push("WHERE t.id = ").push_bind(id);

        let row: Option<TripJoinedRow> =
            query.build_query_as().fetch_optional(&self.pool).await?;

        Ok(row.map(TripResponse::from))
    }

    /// Listar viajes con filtros opcionales, los más recientes primero
    pub async fn list_responses(
        &self,
        driver_id: Option<Uuid>,
        vehicle_id: Option<Uuid>,
    ) -> Result<Vec<TripResponse>, AppError> {
        let mut query: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(JOINED_SELECT);
        query.push("WHERE 1 = 1");

        if let Some(driver_id) = driver_id {
            query.push(" AND t.driver_id = ").push_bind(driver_id);
        }
        if let Some(vehicle_id) = vehicle_id {
            query.push(" AND t.vehicle_id = ").push_bind(vehicle_id);
        }

        query.push(" ORDER BY t.start_time DESC");

        let rows: Vec<TripJoinedRow> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(TripResponse::from).collect())
    }
}
