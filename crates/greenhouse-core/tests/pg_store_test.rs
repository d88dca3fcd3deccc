//! `PlantStore` over PostgreSQL.
//!
//! Each test creates an isolated temporary database in the shared
//! PostgreSQL instance and drops it on completion.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use greenhouse_core::store::PgPlantRepository;
use greenhouse_core::{ManualClock, NewPlant, PlantError, PlantPatch, PlantStore};
use greenhouse_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn crud_round_trip() {
    let (pool, db_name) = create_test_db().await;
    let t0 = Utc.with_ymd_and_hms(2024, 7, 4, 9, 15, 0).unwrap();
    let clock = Arc::new(ManualClock::new(t0));
    let store = PlantStore::new(Arc::new(PgPlantRepository::new(pool.clone())), clock.clone());

    let plant = store
        .create(NewPlant::new("Monty", "Monstera", 7.0))
        .await
        .expect("create should succeed");
    assert_eq!(store.get(plant.id).await.unwrap(), plant);

    clock.advance(Duration::days(7));
    let due = store.needing_water().await.unwrap();
    assert_eq!(due, vec![plant.clone()]);

    let watered = store.water(plant.id).await.unwrap();
    assert_eq!(watered.last_watered, t0 + Duration::days(7));
    assert!(store.needing_water().await.unwrap().is_empty());

    clock.advance(Duration::hours(1));
    let updated = store
        .update(
            plant.id,
            PlantPatch {
                species: Some("Monstera deliciosa".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.species, "Monstera deliciosa");
    assert_eq!(updated.last_watered, watered.last_watered);
    assert_eq!(updated.updated_at, Some(t0 + Duration::days(7) + Duration::hours(1)));

    let deleted = store.delete(plant.id).await.unwrap();
    assert_eq!(deleted, updated);
    assert!(matches!(
        store.delete(plant.id).await,
        Err(PlantError::NotFound(_))
    ));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn missing_ids_do_not_mutate() {
    let (pool, db_name) = create_test_db().await;
    let store = PlantStore::postgres(pool.clone());

    let kept = store
        .create(NewPlant::new("Spike", "Cactus", 21.0))
        .await
        .unwrap();
    let missing = Uuid::new_v4();

    assert!(matches!(store.water(missing).await, Err(PlantError::NotFound(_))));
    assert!(matches!(
        store.update(missing, PlantPatch::default()).await,
        Err(PlantError::NotFound(_))
    ));
    assert_eq!(store.get_all().await.unwrap(), vec![kept]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn concurrent_waterings_serialize() {
    let (pool, db_name) = create_test_db().await;
    let store = PlantStore::postgres(pool.clone());
    let plant = store
        .create(NewPlant::new("Ivy", "Hedera", 2.0))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let patch = PlantPatch {
                notes: Some(format!("pass {i}")),
                ..Default::default()
            };
            store.update(plant.id, patch).await?;
            store.water(plant.id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().expect("writes should succeed");
    }

    let stored = store.get(plant.id).await.unwrap();
    assert!(stored.last_watered >= plant.last_watered);
    assert!(stored.notes.starts_with("pass "));

    pool.close().await;
    drop_test_db(&db_name).await;
}
