use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};

/// Day of a recurring weekly slot. Serialized with the studio's Indonesian
/// day names; English names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayOfWeek {
    #[serde(rename = "senin", alias = "monday")]
    Monday,
    #[serde(rename = "selasa", alias = "tuesday")]
    Tuesday,
    #[serde(rename = "rabu", alias = "wednesday")]
    Wednesday,
    #[serde(rename = "kamis", alias = "thursday")]
    Thursday,
    #[serde(rename = "jumat", alias = "friday")]
    Friday,
    #[serde(rename = "sabtu", alias = "saturday")]
    Saturday,
    #[serde(rename = "minggu", alias = "sunday")]
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Stored and wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "senin",
            DayOfWeek::Tuesday => "selasa",
            DayOfWeek::Wednesday => "rabu",
            DayOfWeek::Thursday => "kamis",
            DayOfWeek::Friday => "jumat",
            DayOfWeek::Saturday => "sabtu",
            DayOfWeek::Sunday => "minggu",
        }
    }

    /// 0 for Monday through 6 for Sunday.
    pub fn index(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let day = match s.trim().to_ascii_lowercase().as_str() {
            "senin" | "monday" => DayOfWeek::Monday,
            "selasa" | "tuesday" => DayOfWeek::Tuesday,
            "rabu" | "wednesday" => DayOfWeek::Wednesday,
            "kamis" | "thursday" => DayOfWeek::Thursday,
            "jumat" | "friday" => DayOfWeek::Friday,
            "sabtu" | "saturday" => DayOfWeek::Saturday,
            "minggu" | "sunday" => DayOfWeek::Sunday,
            other => {
                return Err(BookingError::Validation(format!(
                    "Invalid day of week: {}",
                    other
                )));
            }
        };
        Ok(day)
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }
}

/// Inclusive range of weekdays. `from` after `to` wraps over the weekend,
/// so `sabtu..=senin` covers Saturday, Sunday and Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub from: DayOfWeek,
    pub to: DayOfWeek,
}

impl DayRange {
    pub fn new(from: DayOfWeek, to: DayOfWeek) -> Self {
        Self { from, to }
    }

    pub fn full_week() -> Self {
        Self::new(DayOfWeek::Monday, DayOfWeek::Sunday)
    }

    pub fn single(day: DayOfWeek) -> Self {
        Self::new(day, day)
    }

    /// Builds a range from optional query parameters; a missing bound extends
    /// the range to that end of the week.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> BookingResult<Self> {
        let from = match from {
            Some(s) if !s.trim().is_empty() => s.parse()?,
            _ => DayOfWeek::Monday,
        };
        let to = match to {
            Some(s) if !s.trim().is_empty() => s.parse()?,
            _ => DayOfWeek::Sunday,
        };
        Ok(Self::new(from, to))
    }

    pub fn contains(&self, day: DayOfWeek) -> bool {
        if self.from <= self.to {
            self.from <= day && day <= self.to
        } else {
            day >= self.from || day <= self.to
        }
    }
}

impl Default for DayRange {
    fn default() -> Self {
        Self::full_week()
    }
}

/// Parses an `HH:MM` wall-clock time.
pub fn parse_wall_time(value: &str) -> BookingResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        BookingError::Validation(format!("Invalid time '{}', expected HH:MM", value))
    })
}

/// Serde adapter that writes [`NaiveTime`] as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_wall_time(&raw).map_err(D::Error::custom)
    }
}

/// A recurring weekly availability slot declared by a teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherSchedule {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
}

impl TeacherSchedule {
    /// Half-open interval overlap on the same day.
    pub fn overlaps(&self, day: DayOfWeek, start: NaiveTime, end: NaiveTime) -> bool {
        self.day_of_week == day && self.start_time < end && start < self.end_time
    }

    pub fn overlaps_slot(&self, other: &TeacherSchedule) -> bool {
        self.overlaps(other.day_of_week, other.start_time, other.end_time)
    }

    pub fn duration_minutes(&self) -> i32 {
        (self.end_time - self.start_time).num_minutes() as i32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAvailabilityRequest {
    pub day_of_week: String,
    pub start_time: String,
    pub end_time: String,
}

impl AddAvailabilityRequest {
    pub fn new(day_of_week: &str, start_time: &str, end_time: &str) -> Self {
        Self {
            day_of_week: day_of_week.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedDayResponse {
    pub day_of_week: DayOfWeek,
    pub deleted: usize,
}

/// A free slot offered to a student, with the date it would next take place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlot {
    #[serde(flatten)]
    pub schedule: TeacherSchedule,
    pub next_class_date: NaiveDate,
}
