//! Controladores del sistema
//!
//! Autorización por rol/propiedad y mapeo a DTOs sobre los repositorios.

pub mod auth_controller;
pub mod trip_controller;
pub mod user_controller;
pub mod vehicle_controller;
