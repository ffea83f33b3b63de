//! Servicios del sistema
//!
//! Este módulo contiene la lógica de negocio transaccional.

pub mod trip_lifecycle_service;
