use bcrypt::{hash, DEFAULT_COST};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::AuthUser;
use crate::models::user::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::repositories::user_repository::UserRepository;
use crate::utils::errors::AppError;

pub struct UserController {
    repository: UserRepository,
}

impl UserController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: UserRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        auth: AuthUser,
        request: CreateUserRequest,
    ) -> Result<UserResponse, AppError> {
        auth.require_admin()?;
        request.validate()?;

        let password_hash =
            hash(&request.password, DEFAULT_COST).map_err(|e| AppError::Hash(e.to_string()))?;

        let user = self
            .repository
            .create(request.name, request.username, password_hash, request.role)
            .await?;

        Ok(user.into())
    }

    pub async fn list(&self, auth: AuthUser) -> Result<Vec<UserResponse>, AppError> {
        auth.require_admin()?;

        let users = self.repository.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn update(
        &self,
        auth: AuthUser,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        auth.require_admin()?;
        request.validate()?;

        let password_hash = match request.password {
            Some(password) => {
                Some(hash(&password, DEFAULT_COST).map_err(|e| AppError::Hash(e.to_string()))?)
            }
            None => None,
        };

        let user = self
            .repository
            .update(id, request.name, request.username, password_hash, request.role)
            .await?;

        Ok(user.into())
    }

    pub async fn delete(&self, auth: AuthUser, id: Uuid) -> Result<(), AppError> {
        auth.require_admin()?;

        // Un admin no puede borrarse a sí mismo
        if auth.user_id == id {
            return Err(AppError::Conflict("Cannot delete your own account".to_string()));
        }

        self.repository.delete(id).await
    }
}
