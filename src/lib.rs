//! Fleet Trip Tracker - API
//!
//! Backend de seguimiento de flota: vehículos, drivers y el ciclo de
//! vida de viajes con validación de odómetro.

pub mod config;
pub mod controllers;
pub mod database;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::{response::Json, routing::get, Router};
use serde_json::json;

use state::AppState;

/// Construir el router completo de la aplicación
///
/// Mismo router en main y en los tests de integración; las capas de
/// trace y CORS se agregan en main.
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_endpoint))
        .nest("/api/auth", routes::auth_routes::create_auth_router())
        .nest("/api/users", routes::user_routes::create_user_router())
        .nest("/api/vehicles", routes::vehicle_routes::create_vehicle_router())
        .nest("/api/trips", routes::trip_routes::create_trip_router())
        .with_state(app_state)
}

/// Health check simple
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "service": "fleet-trip-tracker",
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
