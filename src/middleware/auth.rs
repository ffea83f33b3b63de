//! Middleware de autenticación
//!
//! Extractor de Axum que convierte el bearer token en un `AuthUser`
//! explícito: la identidad llega a cada handler como parámetro, nunca
//! como estado ambiental.

use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use uuid::Uuid;

use crate::models::auth::{AuthUser, Role};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{self, JwtConfig};

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = jwt::extract_token_from_header(auth_header)?;
        let claims = jwt::verify_token(token, &JwtConfig::from(&state.config))?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Jwt("Token con subject inválido".to_string()))?;
        let role: Role = claims.role.parse()?;

        Ok(AuthUser { user_id, role })
    }
}
