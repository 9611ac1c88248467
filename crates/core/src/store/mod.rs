//! # Persistence interface
//!
//! Every service operation runs inside exactly one [`StoreTx`]. Reads that
//! end in a `_for_update` lock the rows they return until the transaction
//! ends, so a check made on them still holds at commit. Dropping a
//! transaction without calling [`StoreTx::commit`] rolls it back.
//!
//! Two implementations exist: [`memory::MemoryStore`] here, and the
//! PostgreSQL store in the `lessonbook-db` crate.

pub mod memory;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::{
    errors::BookingResult,
    models::{
        booking::Booking,
        catalog::{Instrument, Package},
        history::{ClassDocumentation, ClassHistory},
        quota::StudentPackage,
        schedule::TeacherSchedule,
    },
};

pub use memory::MemoryStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> BookingResult<Box<dyn StoreTx>>;
}

#[async_trait]
pub trait StoreTx: Send {
    /// Serializes transactions acting on behalf of the same teacher or
    /// student until this transaction ends.
    async fn lock_user(&mut self, user_id: Uuid) -> BookingResult<()>;
    /// Serializes transactions booking lessons at the same date and start
    /// time. Taken after every row lock of the transaction.
    async fn lock_timeslot(&mut self, class_date: NaiveDate, start_time: NaiveTime) -> BookingResult<()>;

    // Catalog
    async fn instrument(&mut self, id: Uuid) -> BookingResult<Option<Instrument>>;
    async fn instrument_by_name(&mut self, name: &str) -> BookingResult<Option<Instrument>>;
    async fn list_instruments(&mut self) -> BookingResult<Vec<Instrument>>;
    async fn insert_instrument(&mut self, instrument: &Instrument) -> BookingResult<()>;
    async fn update_instrument(&mut self, instrument: &Instrument) -> BookingResult<()>;
    async fn delete_instrument(&mut self, id: Uuid) -> BookingResult<()>;
    /// Referenced by a package or a teacher assignment.
    async fn instrument_in_use(&mut self, id: Uuid) -> BookingResult<bool>;

    async fn package(&mut self, id: Uuid) -> BookingResult<Option<Package>>;
    async fn package_by_name(&mut self, name: &str) -> BookingResult<Option<Package>>;
    async fn list_packages(&mut self) -> BookingResult<Vec<Package>>;
    async fn insert_package(&mut self, package: &Package) -> BookingResult<()>;
    async fn update_package(&mut self, package: &Package) -> BookingResult<()>;
    async fn delete_package(&mut self, id: Uuid) -> BookingResult<()>;
    /// Issued to at least one student.
    async fn package_in_use(&mut self, id: Uuid) -> BookingResult<bool>;

    async fn teacher_instruments(&mut self, teacher_id: Uuid) -> BookingResult<Vec<Uuid>>;
    async fn set_teacher_instruments(
        &mut self,
        teacher_id: Uuid,
        instrument_ids: &[Uuid],
    ) -> BookingResult<()>;

    // Availability
    async fn schedule(&mut self, id: Uuid) -> BookingResult<Option<TeacherSchedule>>;
    async fn schedule_for_update(&mut self, id: Uuid) -> BookingResult<Option<TeacherSchedule>>;
    /// Ordered by day, then start time.
    async fn schedules_for_teacher(&mut self, teacher_id: Uuid) -> BookingResult<Vec<TeacherSchedule>>;
    /// Unbooked slots of teachers teaching any of `instrument_ids`, ordered
    /// by day, then start time.
    async fn free_schedules_for_instruments(
        &mut self,
        instrument_ids: &[Uuid],
    ) -> BookingResult<Vec<TeacherSchedule>>;
    async fn insert_schedule(&mut self, schedule: &TeacherSchedule) -> BookingResult<()>;
    async fn set_schedule_booked(&mut self, id: Uuid, is_booked: bool) -> BookingResult<()>;
    /// Retires the slot. Bookings keep referring to it, but it is no longer
    /// returned by any schedule read.
    async fn delete_schedule(&mut self, id: Uuid) -> BookingResult<()>;
    async fn schedule_has_history(&mut self, id: Uuid) -> BookingResult<bool>;

    // Quota ledger
    /// All entries of the student, soonest `end_date` first.
    async fn student_packages(&mut self, student_id: Uuid) -> BookingResult<Vec<StudentPackage>>;
    /// Same as [`StoreTx::student_packages`], locking the entries.
    async fn student_packages_for_update(
        &mut self,
        student_id: Uuid,
    ) -> BookingResult<Vec<StudentPackage>>;
    async fn student_package_for_update(&mut self, id: Uuid) -> BookingResult<Option<StudentPackage>>;
    async fn insert_student_package(&mut self, entry: &StudentPackage) -> BookingResult<()>;
    async fn set_remaining_quota(&mut self, id: Uuid, remaining_quota: i32) -> BookingResult<()>;

    // Bookings
    async fn booking_for_update(&mut self, id: Uuid) -> BookingResult<Option<Booking>>;
    /// Newest first.
    async fn bookings_for_student(&mut self, student_id: Uuid) -> BookingResult<Vec<Booking>>;
    /// Newest first.
    async fn bookings_for_teacher(&mut self, teacher_id: Uuid) -> BookingResult<Vec<Booking>>;
    /// Fails with `Conflict` if the schedule already has a booked booking.
    async fn insert_booking(&mut self, booking: &Booking) -> BookingResult<()>;
    async fn update_booking(&mut self, booking: &Booking) -> BookingResult<()>;
    /// Instrument name of every `booked` lesson on `class_date` whose slot
    /// starts at `start_time`, one per lesson.
    async fn booked_instrument_names_at(
        &mut self,
        class_date: NaiveDate,
        start_time: NaiveTime,
    ) -> BookingResult<Vec<String>>;

    // Class history
    /// Inserts the history with its documentation. Fails with `Duplicate` if
    /// the booking already has a history.
    async fn insert_class_history(&mut self, history: &ClassHistory) -> BookingResult<()>;
    async fn class_history_for_update(&mut self, id: Uuid) -> BookingResult<Option<ClassHistory>>;
    async fn class_history_by_booking(&mut self, booking_id: Uuid)
    -> BookingResult<Option<ClassHistory>>;
    /// Newest lesson first.
    async fn histories_for_student(&mut self, student_id: Uuid) -> BookingResult<Vec<ClassHistory>>;
    /// Newest lesson first.
    async fn histories_for_teacher(&mut self, teacher_id: Uuid) -> BookingResult<Vec<ClassHistory>>;
    /// Every history, newest lesson first.
    async fn list_histories(&mut self) -> BookingResult<Vec<ClassHistory>>;
    async fn insert_documentation(&mut self, documentation: &ClassDocumentation) -> BookingResult<()>;

    async fn commit(self: Box<Self>) -> BookingResult<()>;
}
