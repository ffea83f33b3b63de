//! Repositorios de acceso a datos
//!
//! CRUD crudo con sqlx. Las variantes que reciben `&mut PgConnection`
//! participan en las transacciones del coordinador de ciclo de vida.

pub mod trip_repository;
pub mod user_repository;
pub mod vehicle_repository;
