use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{
    errors::{BookingError, BookingResult},
    models::schedule::DayOfWeek,
};

pub const DEFAULT_VALIDITY_MONTHS: u32 = 1;
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Jakarta;
pub const DEFAULT_CANCELLATION_NOTICE_HOURS: u32 = 24;
pub const REGULAR_ROOM_LIMIT: u32 = 8;
pub const DRUM_ROOM_LIMIT: u32 = 3;

/// How many lessons may run at the same date and start time, per room kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomLimits {
    pub regular: u32,
    pub drum: u32,
}

impl Default for RoomLimits {
    fn default() -> Self {
        Self {
            regular: REGULAR_ROOM_LIMIT,
            drum: DRUM_ROOM_LIMIT,
        }
    }
}

impl RoomLimits {
    /// Drum lessons share the drum rooms; everything else the regular ones.
    pub fn is_drum(instrument_name: &str) -> bool {
        instrument_name
            .trim()
            .to_ascii_lowercase()
            .starts_with("drum")
    }

    pub fn limit_for(&self, instrument_name: &str) -> u32 {
        if Self::is_drum(instrument_name) {
            self.drum
        } else {
            self.regular
        }
    }
}

/// Studio business policy handed to the services.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerPolicy {
    /// How long an assigned package stays valid.
    pub package_validity_months: u32,
    /// Wall clock that slot times are expressed in.
    pub timezone: Tz,
    /// Students must cancel at least this long before the lesson starts.
    pub cancellation_notice_hours: u32,
    pub room_limits: RoomLimits,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            package_validity_months: DEFAULT_VALIDITY_MONTHS,
            timezone: DEFAULT_TIMEZONE,
            cancellation_notice_hours: DEFAULT_CANCELLATION_NOTICE_HOURS,
            room_limits: RoomLimits::default(),
        }
    }
}

impl LedgerPolicy {
    pub fn validity_end(&self, start: DateTime<Utc>) -> BookingResult<DateTime<Utc>> {
        start
            .checked_add_months(Months::new(self.package_validity_months))
            .ok_or_else(|| {
                BookingError::Validation(format!(
                    "Validity window of {} months is out of range",
                    self.package_validity_months
                ))
            })
    }

    /// Studio-local date on which a weekly slot next takes place. A slot that
    /// already started today rolls over to next week.
    pub fn next_class_date(&self, day: DayOfWeek, start: NaiveTime, now: DateTime<Utc>) -> NaiveDate {
        let local = now.with_timezone(&self.timezone);
        let today = local.date_naive();

        let target = day.index() as i64;
        let current = today.weekday().num_days_from_monday() as i64;
        let mut days_until = (target - current).rem_euclid(7);
        if days_until == 0 && local.time() > start {
            days_until = 7;
        }

        today + Duration::days(days_until)
    }

    /// The instant a lesson on `date` starting at `start` begins.
    pub fn class_start(&self, date: NaiveDate, start: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(start);
        match self.timezone.from_local_datetime(&local).earliest() {
            Some(at) => at.with_timezone(&Utc),
            // skipped by a DST jump; read it as UTC
            None => Utc.from_utc_datetime(&local),
        }
    }

    /// Whether a student may still cancel a lesson starting at `class_start`.
    pub fn allows_student_cancel(&self, class_start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        class_start - now >= Duration::hours(self.cancellation_notice_hours as i64)
    }
}
