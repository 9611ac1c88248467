use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Completed,
    Cancelled,
    Rescheduled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != BookingStatus::Booked
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(BookingStatus::Booked),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "rescheduled" => Ok(BookingStatus::Rescheduled),
            other => Err(BookingError::Validation(format!(
                "Unknown booking status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub student_id: Uuid,
    pub schedule_id: Uuid,
    pub student_package_id: Uuid,
    pub class_date: NaiveDate,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub rescheduled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub notes: Option<String>,
}

impl Booking {
    pub fn new(
        student_id: Uuid,
        schedule_id: Uuid,
        student_package_id: Uuid,
        class_date: NaiveDate,
        booked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            schedule_id,
            student_package_id,
            class_date,
            status: BookingStatus::Booked,
            booked_at,
            completed_at: None,
            cancelled_at: None,
            rescheduled_at: None,
            cancelled_by: None,
            notes: None,
        }
    }

    fn ensure_booked(&self) -> BookingResult<()> {
        if self.status == BookingStatus::Booked {
            Ok(())
        } else {
            Err(BookingError::InvalidState(format!(
                "Booking {} is {}, expected booked",
                self.id, self.status
            )))
        }
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> BookingResult<()> {
        self.ensure_booked()?;
        self.status = BookingStatus::Completed;
        self.completed_at = Some(at);
        Ok(())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>, by: Uuid, reason: Option<String>) -> BookingResult<()> {
        self.ensure_booked()?;
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(at);
        self.cancelled_by = Some(by);
        if reason.is_some() {
            self.notes = reason;
        }
        Ok(())
    }

    pub fn mark_rescheduled(&mut self, at: DateTime<Utc>) -> BookingResult<()> {
        self.ensure_booked()?;
        self.status = BookingStatus::Rescheduled;
        self.rescheduled_at = Some(at);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub schedule_id: Uuid,
    pub instrument_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinishClassRequest {
    pub notes: Option<String>,
    #[serde(default)]
    pub documentation_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleBookingRequest {
    pub schedule_id: Uuid,
}
