use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{booking::BookingStatus, schedule::hhmm};

/// Archive entry for a completed lesson. One per booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassHistory {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub instrument_id: Uuid,
    pub package_id: Option<Uuid>,
    pub status: BookingStatus,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub notes: Option<String>,
    pub documentations: Vec<ClassDocumentation>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDocumentation {
    pub id: Uuid,
    pub class_history_id: Uuid,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDocumentationRequest {
    pub url: String,
}
