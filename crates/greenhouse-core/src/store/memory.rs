use std::collections::BTreeMap;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{PlantEdit, PlantRepository};
use crate::error::PlantError;
use crate::Plant;

/// Non-durable repository backed by an ordered map.
///
/// Used by `greenhouse serve --in-memory` and by tests that do not need
/// PostgreSQL. Writers hold the map's write lock for the whole
/// read-modify-write, so readers never see a half-applied edit.
#[derive(Debug, Default)]
pub struct MemoryPlantRepository {
    plants: RwLock<BTreeMap<Uuid, Plant>>,
}

impl MemoryPlantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlantRepository for MemoryPlantRepository {
    async fn all(&self) -> Result<Vec<Plant>, PlantError> {
        Ok(self.plants.read().await.values().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Plant>, PlantError> {
        Ok(self.plants.read().await.get(&id).cloned())
    }

    async fn insert(&self, plant: Plant) -> Result<Plant, PlantError> {
        let mut plants = self.plants.write().await;
        if plants.contains_key(&plant.id) {
            return Err(anyhow!("plant {} already exists", plant.id).into());
        }
        plants.insert(plant.id, plant.clone());
        Ok(plant)
    }

    async fn modify(&self, id: Uuid, edit: PlantEdit) -> Result<Option<Plant>, PlantError> {
        let mut plants = self.plants.write().await;
        let Some(current) = plants.get(&id).cloned() else {
            return Ok(None);
        };
        let updated = edit(current)?;
        plants.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn remove(&self, id: Uuid) -> Result<Option<Plant>, PlantError> {
        Ok(self.plants.write().await.remove(&id))
    }
}
