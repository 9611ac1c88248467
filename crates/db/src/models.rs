//! Row types as stored in PostgreSQL, and their conversions into the
//! domain models.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use lessonbook_core::{
    errors::BookingError,
    models::{
        booking::Booking,
        catalog::{Instrument, Package},
        history::{ClassDocumentation, ClassHistory},
        quota::StudentPackage,
        schedule::TeacherSchedule,
    },
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbInstrument {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbPackage {
    pub id: Uuid,
    pub name: String,
    pub quota: i32,
    pub instrument_id: Uuid,
    pub duration_minutes: i32,
    pub description: String,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTeacherSchedule {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub day_of_week: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbStudentPackage {
    pub id: Uuid,
    pub student_id: Uuid,
    pub package_id: Uuid,
    pub quota: i32,
    pub remaining_quota: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub student_id: Uuid,
    pub schedule_id: Uuid,
    pub student_package_id: Uuid,
    pub class_date: NaiveDate,
    pub status: String,
    pub booked_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub rescheduled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbClassHistory {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub instrument_id: Uuid,
    pub package_id: Option<Uuid>,
    pub status: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbClassDocumentation {
    pub id: Uuid,
    pub class_history_id: Uuid,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

// Values read back from the database are trusted to satisfy the table's
// CHECK constraints; anything else is a storage fault.
fn corrupt(err: BookingError) -> BookingError {
    BookingError::Storage(eyre::eyre!("Corrupt row: {}", err))
}

impl From<DbInstrument> for Instrument {
    fn from(row: DbInstrument) -> Self {
        Instrument {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl From<DbPackage> for Package {
    fn from(row: DbPackage) -> Self {
        Package {
            id: row.id,
            name: row.name,
            quota: row.quota,
            instrument_id: row.instrument_id,
            duration_minutes: row.duration_minutes,
            description: row.description,
            price: row.price,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<DbTeacherSchedule> for TeacherSchedule {
    type Error = BookingError;

    fn try_from(row: DbTeacherSchedule) -> Result<Self, Self::Error> {
        Ok(TeacherSchedule {
            id: row.id,
            teacher_id: row.teacher_id,
            day_of_week: row.day_of_week.parse().map_err(corrupt)?,
            start_time: row.start_time,
            end_time: row.end_time,
            is_booked: row.is_booked,
            created_at: row.created_at,
        })
    }
}

impl From<DbStudentPackage> for StudentPackage {
    fn from(row: DbStudentPackage) -> Self {
        StudentPackage {
            id: row.id,
            student_id: row.student_id,
            package_id: row.package_id,
            quota: row.quota,
            remaining_quota: row.remaining_quota,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

impl TryFrom<DbBooking> for Booking {
    type Error = BookingError;

    fn try_from(row: DbBooking) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            student_id: row.student_id,
            schedule_id: row.schedule_id,
            student_package_id: row.student_package_id,
            class_date: row.class_date,
            status: row.status.parse().map_err(corrupt)?,
            booked_at: row.booked_at,
            completed_at: row.completed_at,
            cancelled_at: row.cancelled_at,
            rescheduled_at: row.rescheduled_at,
            cancelled_by: row.cancelled_by,
            notes: row.notes,
        })
    }
}

impl From<DbClassDocumentation> for ClassDocumentation {
    fn from(row: DbClassDocumentation) -> Self {
        ClassDocumentation {
            id: row.id,
            class_history_id: row.class_history_id,
            url: row.url,
            created_at: row.created_at,
        }
    }
}

impl DbClassHistory {
    /// Joins the row with its attachments.
    pub fn into_history(
        self,
        documentations: Vec<ClassDocumentation>,
    ) -> Result<ClassHistory, BookingError> {
        Ok(ClassHistory {
            id: self.id,
            booking_id: self.booking_id,
            teacher_id: self.teacher_id,
            student_id: self.student_id,
            instrument_id: self.instrument_id,
            package_id: self.package_id,
            status: self.status.parse().map_err(corrupt)?,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            notes: self.notes,
            documentations,
            created_at: self.created_at,
        })
    }
}
