//! Modelos de autenticación
//!
//! Rol de usuario, identidad autenticada y DTOs de login.

use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::UserResponse;
use crate::utils::errors::AppError;

/// Rol del usuario - mapea al ENUM user_role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Driver,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Driver => write!(f, "DRIVER"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "DRIVER" => Ok(Role::Driver),
            other => Err(AppError::Jwt(format!("Rol desconocido: {}", other))),
        }
    }
}

/// Identidad autenticada que llega a cada handler
///
/// Siempre explícita como parámetro: no hay sesión ambiental ni estado
/// global de request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Exigir rol admin
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role != Role::Admin {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }
        Ok(())
    }

    /// Exigir rol driver
    pub fn require_driver(&self) -> Result<(), AppError> {
        if self.role != Role::Driver {
            return Err(AppError::Forbidden("Driver role required".to_string()));
        }
        Ok(())
    }
}

/// Request de login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(length(min = 6, max = 100))]
    pub password: String,
}

/// Response de login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}
