//! Database query functions for the `plants` table.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Plant;

/// Insert a fully-populated plant row. Returns the row as stored.
pub async fn insert_plant(pool: &PgPool, plant: &Plant) -> Result<Plant> {
    let plant = sqlx::query_as::<_, Plant>(
        "INSERT INTO plants \
         (id, name, species, water_frequency_days, notes, last_watered, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(plant.id)
    .bind(&plant.name)
    .bind(&plant.species)
    .bind(plant.water_frequency_days)
    .bind(&plant.notes)
    .bind(plant.last_watered)
    .bind(plant.created_at)
    .bind(plant.updated_at)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert plant {}", plant.id))?;

    Ok(plant)
}

/// Fetch a plant by its ID.
pub async fn get_plant(pool: &PgPool, id: Uuid) -> Result<Option<Plant>> {
    let plant = sqlx::query_as::<_, Plant>("SELECT * FROM plants WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch plant {id}"))?;

    Ok(plant)
}

/// List all plants, ordered by creation time (oldest first).
pub async fn list_plants(pool: &PgPool) -> Result<Vec<Plant>> {
    let plants = sqlx::query_as::<_, Plant>("SELECT * FROM plants ORDER BY created_at, id")
        .fetch_all(pool)
        .await
        .context("failed to list plants")?;

    Ok(plants)
}

/// Fetch a plant and lock its row until the surrounding transaction ends.
pub async fn lock_plant(conn: &mut PgConnection, id: Uuid) -> Result<Option<Plant>> {
    let plant = sqlx::query_as::<_, Plant>("SELECT * FROM plants WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await
        .with_context(|| format!("failed to lock plant {id}"))?;

    Ok(plant)
}

/// Overwrite the mutable columns of an existing plant row.
///
/// `id` and `created_at` are never written. Fails if the row is gone.
pub async fn replace_plant(conn: &mut PgConnection, plant: &Plant) -> Result<Plant> {
    let stored = sqlx::query_as::<_, Plant>(
        "UPDATE plants \
         SET name = $2, species = $3, water_frequency_days = $4, notes = $5, \
             last_watered = $6, updated_at = $7 \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(plant.id)
    .bind(&plant.name)
    .bind(&plant.species)
    .bind(plant.water_frequency_days)
    .bind(&plant.notes)
    .bind(plant.last_watered)
    .bind(plant.updated_at)
    .fetch_optional(conn)
    .await
    .with_context(|| format!("failed to update plant {}", plant.id))?;

    stored.with_context(|| format!("plant {} not found", plant.id))
}

/// Delete a plant, returning the removed row if it existed.
pub async fn delete_plant(pool: &PgPool, id: Uuid) -> Result<Option<Plant>> {
    let plant = sqlx::query_as::<_, Plant>("DELETE FROM plants WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to delete plant {id}"))?;

    Ok(plant)
}

/// Number of plants currently stored.
pub async fn count_plants(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plants")
        .fetch_one(pool)
        .await
        .context("failed to count plants")?;

    Ok(count)
}
