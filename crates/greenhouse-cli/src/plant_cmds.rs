//! `greenhouse plant ...` commands: operate on the store from the terminal.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use greenhouse_core::query::{days_since_watered, is_due, parse_range};
use greenhouse_core::{NewPlant, Plant, PlantPatch, PlantStore};

use crate::PlantCommands;

pub async fn run_plant_command(command: PlantCommands, store: &PlantStore) -> Result<()> {
    match command {
        PlantCommands::Add {
            name,
            species,
            every,
            notes,
        } => {
            let mut new = NewPlant::new(name, species, every);
            new.notes = notes;
            let plant = store.create(new).await?;
            println!("Added plant {} ({})", plant.name, plant.id);
        }
        PlantCommands::List {
            due,
            species,
            from,
            to,
            json,
        } => {
            let plants = if due {
                store.needing_water().await?
            } else if let Some(species) = species {
                store.by_species(&species).await?
            } else if from.is_some() || to.is_some() {
                let (start, end) = parse_range(from.as_deref(), to.as_deref())?;
                store.created_between(start, end).await?
            } else {
                store.get_all().await?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&plants)?);
            } else {
                print_table(&plants, store.now());
            }
        }
        PlantCommands::Show { id, json } => {
            let plant = store.get(parse_id(&id)?).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plant)?);
            } else {
                print_detail(&plant, store.now());
            }
        }
        PlantCommands::Water { id } => {
            let plant = store.water(parse_id(&id)?).await?;
            println!(
                "Watered {} at {}",
                plant.name,
                plant.last_watered.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        PlantCommands::Update {
            id,
            name,
            species,
            every,
            notes,
        } => {
            let patch = PlantPatch {
                name,
                species,
                water_frequency_days: every,
                notes,
            };
            let plant = store.update(parse_id(&id)?, patch).await?;
            println!("Updated plant {} ({})", plant.name, plant.id);
        }
        PlantCommands::Remove { id } => {
            let plant = store.delete(parse_id(&id)?).await?;
            println!("Removed plant {} ({})", plant.name, plant.id);
        }
    }
    Ok(())
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("invalid plant ID: {raw}"))
}

fn print_table(plants: &[Plant], now: DateTime<Utc>) {
    if plants.is_empty() {
        println!("No plants found.");
        return;
    }

    println!(
        "{:<36}  {:<20}  {:<20}  {:>6}  {:>8}  DUE",
        "ID", "NAME", "SPECIES", "EVERY", "SINCE"
    );
    for plant in plants {
        println!(
            "{:<36}  {:<20}  {:<20}  {:>5}d  {:>7.1}d  {}",
            plant.id,
            truncate(&plant.name, 20),
            truncate(&plant.species, 20),
            plant.water_frequency_days,
            days_since_watered(plant, now),
            if is_due(plant, now) { "yes" } else { "" },
        );
    }
}

fn print_detail(plant: &Plant, now: DateTime<Utc>) {
    println!("Plant: {} ({})", plant.name, plant.id);
    println!("Species: {}", plant.species);
    println!("Water every: {} days", plant.water_frequency_days);
    println!(
        "Last watered: {} ({:.1} days ago)",
        plant.last_watered.format("%Y-%m-%d %H:%M:%S UTC"),
        days_since_watered(plant, now)
    );
    println!("Needs water: {}", if is_due(plant, now) { "yes" } else { "no" });
    println!("Created: {}", plant.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(updated_at) = plant.updated_at {
        println!("Updated: {}", updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if !plant.notes.is_empty() {
        println!("Notes: {}", plant.notes);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
