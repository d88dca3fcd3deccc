use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PlantError;
use crate::Plant;

/// Edit applied to a stored plant inside [`PlantRepository::modify`].
///
/// Returning an error aborts the modification and leaves the record as it was.
pub type PlantEdit = Box<dyn FnOnce(Plant) -> Result<Plant, PlantError> + Send>;

/// Keyed storage primitive behind [`super::PlantStore`].
///
/// Each method is atomic with respect to a single id. Implementations
/// return owned copies; nothing they hand out aliases stored state.
#[async_trait]
pub trait PlantRepository: Send + Sync {
    /// Every stored plant. Callers must not rely on the order.
    async fn all(&self) -> Result<Vec<Plant>, PlantError>;

    async fn get(&self, id: Uuid) -> Result<Option<Plant>, PlantError>;

    /// Store a new plant. Fails if the id is already taken.
    async fn insert(&self, plant: Plant) -> Result<Plant, PlantError>;

    /// Read, edit and write back one plant while holding exclusive access
    /// to it. Returns `Ok(None)` when the id is absent.
    async fn modify(&self, id: Uuid, edit: PlantEdit) -> Result<Option<Plant>, PlantError>;

    /// Remove a plant, returning it if it existed.
    async fn remove(&self, id: Uuid) -> Result<Option<Plant>, PlantError>;
}
