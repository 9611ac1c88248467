use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lesson lengths a package can be sold for, in minutes.
pub const LESSON_DURATIONS: [i32; 2] = [30, 60];
pub const DEFAULT_LESSON_MINUTES: i32 = 60;

fn default_lesson_minutes() -> i32 {
    DEFAULT_LESSON_MINUTES
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Template for a lesson subscription. Issued quotas are copied into
/// [`StudentPackage`](crate::models::quota::StudentPackage) rows, so editing a
/// package never reaches back into them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub name: String,
    pub quota: i32,
    pub instrument_id: Uuid,
    /// Length of one lesson; only slots of exactly this length are covered.
    pub duration_minutes: i32,
    pub description: String,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRequest {
    pub name: String,
    pub quota: i32,
    pub instrument_id: Uuid,
    #[serde(default = "default_lesson_minutes")]
    pub duration_minutes: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherInstrumentsRequest {
    pub instrument_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherInstrumentsResponse {
    pub teacher_id: Uuid,
    pub instrument_ids: Vec<Uuid>,
}
