//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

/// Errores del ciclo de vida viaje/vehículo
///
/// Enumeración cerrada: cada operación del coordinador (`start_trip`,
/// `end_trip`) sólo puede fallar con uno de estos valores.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("Vehicle not found")]
    VehicleNotFound,

    #[error("Trip not found")]
    TripNotFound,

    #[error("Vehicle is not available for trips")]
    VehicleNotAvailable,

    #[error("Trip is not currently running")]
    TripNotRunning,

    #[error("Start KM ({start_km}) cannot be less than current vehicle KM ({current_km})")]
    StartKmBelowCurrent { start_km: Decimal, current_km: Decimal },

    #[error("End KM ({end_km}) cannot be less than start KM ({start_km})")]
    EndKmBelowStart { end_km: Decimal, start_km: Decimal },

    #[error("KM reading cannot be negative")]
    NegativeKm,

    #[error("Driver already has a running trip")]
    DriverAlreadyOnTrip,

    #[error("New KM ({new_km}) would regress vehicle odometer ({current_km})")]
    KmRegression { new_km: Decimal, current_km: Decimal },

    #[error("Trip does not belong to this driver")]
    Forbidden,

    #[error("Concurrent update conflict, please retry")]
    SerializationConflict,
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        let message = err.to_string();
        match err {
            LifecycleError::VehicleNotFound | LifecycleError::TripNotFound => {
                AppError::NotFound(message)
            }
            LifecycleError::VehicleNotAvailable
            | LifecycleError::DriverAlreadyOnTrip
            | LifecycleError::KmRegression { .. }
            | LifecycleError::SerializationConflict => AppError::Conflict(message),
            LifecycleError::Forbidden => AppError::Forbidden(message),
            LifecycleError::TripNotRunning
            | LifecycleError::StartKmBelowCurrent { .. }
            | LifecycleError::EndKmBelowStart { .. }
            | LifecycleError::NegativeKm => AppError::BadRequest(message),
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    code: Some("VALIDATION_ERROR".to_string()),
                },
            ),

            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "Unauthorized".to_string(),
                    message: msg,
                    details: None,
                    code: Some("UNAUTHORIZED".to_string()),
                },
            ),

            AppError::Forbidden(msg) => {
                // Señal de posible uso indebido, queda en el log
                tracing::warn!("Forbidden access: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: "Forbidden".to_string(),
                        message: msg,
                        details: None,
                        code: Some("FORBIDDEN".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code: Some("NOT_FOUND".to_string()),
                },
            ),

            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message: msg,
                    details: None,
                    code: Some("CONFLICT".to_string()),
                },
            ),

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Bad Request".to_string(),
                    message: msg,
                    details: None,
                    code: Some("BAD_REQUEST".to_string()),
                },
            ),

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }

            AppError::Jwt(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "JWT Error".to_string(),
                    message: msg,
                    details: None,
                    code: Some("JWT_ERROR".to_string()),
                },
            ),

            AppError::Hash(msg) => {
                tracing::error!("Hash error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Hash Error".to_string(),
                        message: "An error occurred while processing credentials".to_string(),
                        details: None,
                        code: Some("HASH_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Detectar violación de restricción UNIQUE (matrícula o username duplicado)
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Detectar violación de clave foránea (entidad aún referenciada)
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23503"),
        _ => false,
    }
}

/// Detectar fallo de serialización de la transacción (SQLSTATE 40001)
pub fn is_serialization_failure(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("40001"),
        _ => false,
    }
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn km(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_lifecycle_error_maps_to_not_found() {
        let err: AppError = LifecycleError::VehicleNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = LifecycleError::TripNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_lifecycle_error_maps_to_conflict() {
        let err: AppError = LifecycleError::VehicleNotAvailable.into();
        assert!(matches!(err, AppError::Conflict(_)));

        let err: AppError = LifecycleError::DriverAlreadyOnTrip.into();
        assert!(matches!(err, AppError::Conflict(_)));

        let err: AppError = LifecycleError::SerializationConflict.into();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_lifecycle_error_maps_to_bad_request() {
        let err: AppError = LifecycleError::StartKmBelowCurrent {
            start_km: km("14000"),
            current_km: km("15000"),
        }
        .into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = LifecycleError::TripNotRunning.into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = LifecycleError::NegativeKm.into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_lifecycle_error_maps_to_forbidden() {
        let err: AppError = LifecycleError::Forbidden.into();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_error_message_carries_offending_values() {
        let err = LifecycleError::StartKmBelowCurrent {
            start_km: km("14000"),
            current_km: km("15000"),
        };
        let msg = err.to_string();
        assert!(msg.contains("14000"));
        assert!(msg.contains("15000"));
    }
}
