//! Pure read-side filters over a snapshot of plant records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::PlantError;
use crate::Plant;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Elapsed time since the last watering, in fractional days.
pub fn days_since_watered(plant: &Plant, now: DateTime<Utc>) -> f64 {
    (now - plant.last_watered).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Whether `plant` is due at `now`. The boundary is inclusive, so a plant
/// with a zero-day frequency is always due.
pub fn is_due(plant: &Plant, now: DateTime<Utc>) -> bool {
    days_since_watered(plant, now) >= plant.water_frequency_days
}

pub fn needs_watering(plants: &[Plant], now: DateTime<Utc>) -> Vec<Plant> {
    plants.iter().filter(|p| is_due(p, now)).cloned().collect()
}

/// Exact species match, ignoring case.
pub fn by_species(plants: &[Plant], species: &str) -> Vec<Plant> {
    let wanted = species.to_lowercase();
    plants
        .iter()
        .filter(|p| p.species.to_lowercase() == wanted)
        .cloned()
        .collect()
}

/// Plants with `start <= created_at <= end`. An inverted range is empty.
pub fn created_between(plants: &[Plant], start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Plant> {
    plants
        .iter()
        .filter(|p| start <= p.created_at && p.created_at <= end)
        .cloned()
        .collect()
}

/// Parse a timestamp as it arrives on the wire.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC, a bare
/// `YYYY-MM-DD` (midnight UTC) or integer epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

/// Parse both bounds of a creation-date range.
pub fn parse_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), PlantError> {
    Ok((parse_bound("start", start)?, parse_bound("end", end)?))
}

fn parse_bound(which: &str, raw: Option<&str>) -> Result<DateTime<Utc>, PlantError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| PlantError::InvalidRange(format!("missing {which} date")))?;
    parse_timestamp(raw)
        .ok_or_else(|| PlantError::InvalidRange(format!("unparsable {which} date {raw:?}")))
}
