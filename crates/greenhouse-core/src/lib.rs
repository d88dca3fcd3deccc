//! Plant store and watering-schedule logic.
//!
//! [`store::PlantStore`] is the single point of mutation for plant records.
//! It validates input, stamps timestamps from an injectable [`clock::Clock`]
//! and delegates durable storage to a [`store::PlantRepository`]. The
//! [`query`] module holds the pure filters the store's read operations use.

pub mod clock;
pub mod error;
pub mod plant;
pub mod query;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::PlantError;
pub use greenhouse_db::models::Plant;
pub use plant::{NewPlant, PlantPatch};
pub use store::PlantStore;
