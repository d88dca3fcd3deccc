//! Create and partial-update inputs, plus the pure transitions applied to
//! a stored [`Plant`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::PlantError;
use crate::Plant;

/// Fields accepted when creating a plant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlant {
    pub name: String,
    pub species: String,
    pub water_frequency_days: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewPlant {
    pub fn new(name: impl Into<String>, species: impl Into<String>, every_days: f64) -> Self {
        Self {
            name: name.into(),
            species: species.into(),
            water_frequency_days: every_days,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), PlantError> {
        validate_text("name", &self.name)?;
        validate_text("species", &self.species)?;
        validate_frequency(self.water_frequency_days)
    }

    /// Build the initial record. `last_watered` and `created_at` are both `now`.
    pub(crate) fn into_plant(self, id: Uuid, now: DateTime<Utc>) -> Plant {
        Plant {
            id,
            name: self.name,
            species: self.species,
            water_frequency_days: self.water_frequency_days,
            notes: self.notes.unwrap_or_default(),
            last_watered: now,
            created_at: now,
            updated_at: None,
        }
    }
}

/// A partial update. A field that is `Some` replaces the stored value;
/// `None` (absent or `null` on the wire) leaves it untouched.
///
/// Identity and timestamps are not part of the patch, so `id`, `createdAt`
/// and `lastWatered` can only change through their dedicated operations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantPatch {
    pub name: Option<String>,
    pub species: Option<String>,
    pub water_frequency_days: Option<f64>,
    pub notes: Option<String>,
}

impl PlantPatch {
    /// Check only the fields that are present.
    pub fn validate(&self) -> Result<(), PlantError> {
        if let Some(name) = &self.name {
            validate_text("name", name)?;
        }
        if let Some(species) = &self.species {
            validate_text("species", species)?;
        }
        if let Some(days) = self.water_frequency_days {
            validate_frequency(days)?;
        }
        Ok(())
    }

    /// Merge the patch over `plant` and stamp `updated_at`.
    pub fn apply(self, mut plant: Plant, now: DateTime<Utc>) -> Plant {
        if let Some(name) = self.name {
            plant.name = name;
        }
        if let Some(species) = self.species {
            plant.species = species;
        }
        if let Some(days) = self.water_frequency_days {
            plant.water_frequency_days = days;
        }
        if let Some(notes) = self.notes {
            plant.notes = notes;
        }
        plant.updated_at = Some(now);
        plant
    }
}

/// Record a watering at `now`.
///
/// `last_watered` never moves backwards, even if the clock does.
pub fn mark_watered(mut plant: Plant, now: DateTime<Utc>) -> Plant {
    plant.last_watered = plant.last_watered.max(now);
    plant.updated_at = Some(now);
    plant
}

fn validate_text(field: &str, value: &str) -> Result<(), PlantError> {
    if value.trim().is_empty() {
        return Err(PlantError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_frequency(days: f64) -> Result<(), PlantError> {
    if !days.is_finite() || days < 0.0 {
        return Err(PlantError::Validation(format!(
            "waterFrequencyDays must be a non-negative number, got {days}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 10, 9, 0, 0).unwrap()
    }

    fn fern() -> Plant {
        NewPlant::new("Boston", "Fern", 5.0)
            .with_notes("bathroom shelf")
            .into_plant(Uuid::new_v4(), t0())
    }

    #[test]
    fn into_plant_sets_timestamps() {
        let plant = fern();
        assert_eq!(plant.created_at, t0());
        assert_eq!(plant.last_watered, t0());
        assert!(plant.updated_at.is_none());
        assert_eq!(plant.notes, "bathroom shelf");
    }

    #[test]
    fn missing_notes_default_to_empty() {
        let plant = NewPlant::new("Boston", "Fern", 5.0).into_plant(Uuid::nil(), t0());
        assert_eq!(plant.notes, "");
    }

    #[test]
    fn create_validation() {
        assert!(NewPlant::new("Boston", "Fern", 0.0).validate().is_ok());
        assert!(NewPlant::new("Boston", "Fern", 2.5).validate().is_ok());

        for bad in [
            NewPlant::new("  ", "Fern", 5.0),
            NewPlant::new("Boston", "", 5.0),
            NewPlant::new("Boston", "Fern", -1.0),
            NewPlant::new("Boston", "Fern", f64::NAN),
            NewPlant::new("Boston", "Fern", f64::INFINITY),
        ] {
            assert!(
                matches!(bad.validate(), Err(PlantError::Validation(_))),
                "expected validation error for {bad:?}"
            );
        }
    }

    #[test]
    fn create_body_requires_typed_fields() {
        let ok: NewPlant = serde_json::from_str(
            r#"{"name":"Boston","species":"Fern","waterFrequencyDays":5}"#,
        )
        .unwrap();
        assert_eq!(ok.water_frequency_days, 5.0);
        assert!(ok.notes.is_none());

        let wrong_type = serde_json::from_str::<NewPlant>(
            r#"{"name":"Boston","species":"Fern","waterFrequencyDays":"5"}"#,
        );
        assert!(wrong_type.is_err());

        let missing = serde_json::from_str::<NewPlant>(r#"{"name":"Boston","species":"Fern"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn patch_changes_only_supplied_fields() {
        let before = fern();
        let now = t0() + Duration::hours(2);
        let patch = PlantPatch {
            notes: Some("x".to_string()),
            ..Default::default()
        };

        let after = patch.apply(before.clone(), now);

        assert_eq!(after.notes, "x");
        assert_eq!(after.updated_at, Some(now));
        assert_eq!(after.name, before.name);
        assert_eq!(after.species, before.species);
        assert_eq!(after.water_frequency_days, before.water_frequency_days);
        assert_eq!(after.last_watered, before.last_watered);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.id, before.id);
    }

    #[test]
    fn patch_null_fields_are_ignored() {
        let patch: PlantPatch =
            serde_json::from_str(r#"{"name":null,"waterFrequencyDays":3}"#).unwrap();
        assert!(patch.name.is_none());
        assert_eq!(patch.water_frequency_days, Some(3.0));
        assert_eq!(
            patch,
            PlantPatch {
                water_frequency_days: Some(3.0),
                ..Default::default()
            }
        );
    }

    #[test]
    fn patch_validation_checks_present_fields() {
        assert!(PlantPatch::default().validate().is_ok());
        let bad = PlantPatch {
            species: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(PlantError::Validation(_))));
        let bad = PlantPatch {
            water_frequency_days: Some(-0.5),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(PlantError::Validation(_))));
    }

    #[test]
    fn watering_is_monotonic() {
        let plant = fern();
        let later = t0() + Duration::days(1);
        let watered = mark_watered(plant.clone(), later);
        assert_eq!(watered.last_watered, later);
        assert_eq!(watered.updated_at, Some(later));

        let earlier = t0() - Duration::days(1);
        let rewound = mark_watered(watered, earlier);
        assert_eq!(rewound.last_watered, later);
        assert_eq!(rewound.updated_at, Some(earlier));
    }
}
