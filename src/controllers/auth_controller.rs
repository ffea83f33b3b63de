use sqlx::PgPool;
use validator::Validate;

use crate::config::environment::EnvironmentConfig;
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::repositories::user_repository::UserRepository;
use crate::utils::errors::AppError;
use crate::utils::jwt::{self, JwtConfig};

pub struct AuthController {
    repository: UserRepository,
    jwt_config: JwtConfig,
}

impl AuthController {
    pub fn new(pool: PgPool, config: &EnvironmentConfig) -> Self {
        Self {
            repository: UserRepository::new(pool),
            jwt_config: JwtConfig::from(config),
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;

        // Mismo mensaje para usuario inexistente y password incorrecto
        let user = self
            .repository
            .find_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

        let password_ok = bcrypt::verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::Hash(e.to_string()))?;

        if !password_ok {
            return Err(AppError::Unauthorized("Invalid username or password".to_string()));
        }

        let token = jwt::generate_token(user.id, user.role, &self.jwt_config)?;

        tracing::info!("Login exitoso: {} ({})", user.username, user.role);

        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }
}
