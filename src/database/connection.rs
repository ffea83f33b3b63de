//! Conexión a PostgreSQL
//!
//! Este módulo maneja la conexión a la base de datos PostgreSQL.

use anyhow::Result;
use sqlx::PgPool;

use crate::config::database::DatabaseConfig;

/// Conexión a la base de datos con su pool
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Crear la conexión con la configuración por defecto (DATABASE_URL)
    pub async fn new_default() -> Result<Self> {
        let config = DatabaseConfig::default();
        let pool = config.create_pool().await?;

        // Verificar que la conexión funciona antes de arrancar
        sqlx::query("SELECT 1").execute(&pool).await?;
        log::info!("✅ Conexión a PostgreSQL verificada");

        Ok(Self { pool })
    }

    /// Obtener el pool de conexiones
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
