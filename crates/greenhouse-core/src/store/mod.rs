//! The plant store: validation, timestamps and identity on top of a
//! [`PlantRepository`].

mod memory;
mod postgres;
mod repository;

pub use memory::MemoryPlantRepository;
pub use postgres::PgPlantRepository;
pub use repository::{PlantEdit, PlantRepository};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::PlantError;
use crate::plant::{self, NewPlant, PlantPatch};
use crate::query;
use crate::Plant;

/// Handle to the plant collection. Cloning is cheap and every clone shares
/// the same repository and clock.
#[derive(Clone)]
pub struct PlantStore {
    repo: Arc<dyn PlantRepository>,
    clock: Arc<dyn Clock>,
}

impl PlantStore {
    pub fn new(repo: Arc<dyn PlantRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// A PostgreSQL-backed store using wall-clock time.
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(Arc::new(PgPlantRepository::new(pool)), Arc::new(SystemClock))
    }

    /// A non-durable store using wall-clock time.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPlantRepository::new()), Arc::new(SystemClock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Validate and insert a new plant.
    pub async fn create(&self, new: NewPlant) -> Result<Plant, PlantError> {
        if let Err(e) = new.validate() {
            warn!(error = %e, "rejected plant creation");
            return Err(e);
        }

        let plant = new.into_plant(Uuid::new_v4(), self.clock.now());
        let plant = self.repo.insert(plant).await?;
        info!(plant_id = %plant.id, name = %plant.name, species = %plant.species, "plant created");
        Ok(plant)
    }

    pub async fn get_all(&self) -> Result<Vec<Plant>, PlantError> {
        self.repo.all().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Plant, PlantError> {
        self.repo.get(id).await?.ok_or(PlantError::NotFound(id))
    }

    /// Merge `patch` over the stored plant.
    ///
    /// The patch is validated before the store is touched, so an invalid
    /// patch never modifies anything.
    pub async fn update(&self, id: Uuid, patch: PlantPatch) -> Result<Plant, PlantError> {
        if let Err(e) = patch.validate() {
            warn!(plant_id = %id, error = %e, "rejected plant update");
            return Err(e);
        }

        let now = self.clock.now();
        let edit: PlantEdit = Box::new(move |current: Plant| Ok(patch.apply(current, now)));
        let plant = self
            .repo
            .modify(id, edit)
            .await?
            .ok_or(PlantError::NotFound(id))?;
        info!(plant_id = %id, "plant updated");
        Ok(plant)
    }

    /// Record a watering now.
    pub async fn water(&self, id: Uuid) -> Result<Plant, PlantError> {
        let now = self.clock.now();
        let edit: PlantEdit = Box::new(move |current: Plant| Ok(plant::mark_watered(current, now)));
        let plant = self
            .repo
            .modify(id, edit)
            .await?
            .ok_or(PlantError::NotFound(id))?;
        info!(plant_id = %id, last_watered = %plant.last_watered, "plant watered");
        Ok(plant)
    }

    /// Remove a plant and return its final state.
    pub async fn delete(&self, id: Uuid) -> Result<Plant, PlantError> {
        let plant = self
            .repo
            .remove(id)
            .await?
            .ok_or(PlantError::NotFound(id))?;
        info!(plant_id = %id, "plant deleted");
        Ok(plant)
    }

    /// Plants due for watering at the current clock time.
    pub async fn needing_water(&self) -> Result<Vec<Plant>, PlantError> {
        self.needing_water_at(self.clock.now()).await
    }

    pub async fn needing_water_at(&self, now: DateTime<Utc>) -> Result<Vec<Plant>, PlantError> {
        let due = query::needs_watering(&self.repo.all().await?, now);
        debug!(count = due.len(), %now, "computed plants needing water");
        Ok(due)
    }

    pub async fn by_species(&self, species: &str) -> Result<Vec<Plant>, PlantError> {
        let found = query::by_species(&self.repo.all().await?, species);
        debug!(species, count = found.len(), "species lookup");
        Ok(found)
    }

    pub async fn created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Plant>, PlantError> {
        let found = query::created_between(&self.repo.all().await?, start, end);
        debug!(%start, %end, count = found.len(), "creation date range lookup");
        Ok(found)
    }
}
