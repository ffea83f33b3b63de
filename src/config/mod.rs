//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de base de datos y variables
//! de entorno del sistema.

pub mod database;
pub mod environment;
