use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `plants` table.
///
/// Serializes with the camelCase field names used on the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    /// Interval between waterings, in (possibly fractional) days.
    pub water_frequency_days: f64,
    pub notes: String,
    pub last_watered: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// `None` until the record is first updated or watered.
    pub updated_at: Option<DateTime<Utc>>,
}
