use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use greenhouse_db::queries::plants as db;

use super::repository::{PlantEdit, PlantRepository};
use crate::error::PlantError;
use crate::Plant;

/// Durable repository over the `plants` table.
///
/// `modify` runs inside a transaction holding a `FOR UPDATE` row lock, so
/// concurrent writers to the same id are serialized by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgPlantRepository {
    pool: PgPool,
}

impl PgPlantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlantRepository for PgPlantRepository {
    async fn all(&self) -> Result<Vec<Plant>, PlantError> {
        Ok(db::list_plants(&self.pool).await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Plant>, PlantError> {
        Ok(db::get_plant(&self.pool, id).await?)
    }

    async fn insert(&self, plant: Plant) -> Result<Plant, PlantError> {
        Ok(db::insert_plant(&self.pool, &plant).await?)
    }

    async fn modify(&self, id: Uuid, edit: PlantEdit) -> Result<Option<Plant>, PlantError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        // Dropping `tx` without commit rolls back and releases the lock.
        let Some(current) = db::lock_plant(&mut *tx, id).await? else {
            return Ok(None);
        };
        let updated = edit(current)?;
        let stored = db::replace_plant(&mut *tx, &updated).await?;

        tx.commit().await.context("failed to commit transaction")?;
        Ok(Some(stored))
    }

    async fn remove(&self, id: Uuid) -> Result<Option<Plant>, PlantError> {
        Ok(db::delete_plant(&self.pool, id).await?)
    }
}
