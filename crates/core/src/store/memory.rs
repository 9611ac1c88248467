//! In-memory [`Store`] used by tests and local runs without PostgreSQL.
//!
//! A transaction holds the store-wide lock for its whole lifetime and works on
//! a private copy of the state, which replaces the shared state on commit.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use eyre::eyre;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    models::{
        booking::{Booking, BookingStatus},
        catalog::{Instrument, Package},
        history::{ClassDocumentation, ClassHistory},
        quota::StudentPackage,
        schedule::TeacherSchedule,
    },
    store::{Store, StoreTx},
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    instruments: HashMap<Uuid, Instrument>,
    packages: HashMap<Uuid, Package>,
    teacher_instruments: HashMap<Uuid, Vec<Uuid>>,
    schedules: HashMap<Uuid, TeacherSchedule>,
    retired_schedules: HashMap<Uuid, TeacherSchedule>,
    student_packages: HashMap<Uuid, StudentPackage>,
    bookings: HashMap<Uuid, Booking>,
    histories: HashMap<Uuid, ClassHistory>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> BookingResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

fn missing(what: &str, id: Uuid) -> BookingError {
    BookingError::Storage(eyre!("{} {} does not exist", what, id))
}

fn sort_schedules(schedules: &mut [TeacherSchedule]) {
    schedules.sort_by_key(|s| (s.day_of_week, s.start_time, s.id));
}

fn sort_histories(histories: &mut [ClassHistory]) {
    histories.sort_by(|a, b| (b.date, b.start_time).cmp(&(a.date, a.start_time)));
}

impl MemoryTx {
    fn teacher_of(&self, schedule_id: Uuid) -> Option<Uuid> {
        self.work
            .schedules
            .get(&schedule_id)
            .or_else(|| self.work.retired_schedules.get(&schedule_id))
            .map(|s| s.teacher_id)
    }

    fn entries_of(&self, student_id: Uuid) -> Vec<StudentPackage> {
        let mut entries: Vec<_> = self
            .work
            .student_packages
            .values()
            .filter(|sp| sp.student_id == student_id)
            .cloned()
            .collect();
        entries.sort_by_key(|sp| (sp.end_date, sp.id));
        entries
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_user(&mut self, _user_id: Uuid) -> BookingResult<()> {
        // the store-wide lock already serializes everything
        Ok(())
    }

    async fn lock_timeslot(&mut self, _class_date: NaiveDate, _start_time: NaiveTime) -> BookingResult<()> {
        Ok(())
    }

    async fn instrument(&mut self, id: Uuid) -> BookingResult<Option<Instrument>> {
        Ok(self.work.instruments.get(&id).cloned())
    }

    async fn instrument_by_name(&mut self, name: &str) -> BookingResult<Option<Instrument>> {
        Ok(self
            .work
            .instruments
            .values()
            .find(|i| i.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_instruments(&mut self) -> BookingResult<Vec<Instrument>> {
        let mut instruments: Vec<_> = self.work.instruments.values().cloned().collect();
        instruments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instruments)
    }

    async fn insert_instrument(&mut self, instrument: &Instrument) -> BookingResult<()> {
        if self
            .work
            .instruments
            .values()
            .any(|i| i.name.eq_ignore_ascii_case(&instrument.name))
        {
            return Err(BookingError::Conflict(format!(
                "Instrument '{}' already exists",
                instrument.name
            )));
        }
        self.work.instruments.insert(instrument.id, instrument.clone());
        Ok(())
    }

    async fn update_instrument(&mut self, instrument: &Instrument) -> BookingResult<()> {
        match self.work.instruments.get_mut(&instrument.id) {
            Some(existing) => {
                *existing = instrument.clone();
                Ok(())
            }
            None => Err(missing("Instrument", instrument.id)),
        }
    }

    async fn delete_instrument(&mut self, id: Uuid) -> BookingResult<()> {
        self.work.instruments.remove(&id);
        Ok(())
    }

    async fn instrument_in_use(&mut self, id: Uuid) -> BookingResult<bool> {
        let by_package = self.work.packages.values().any(|p| p.instrument_id == id);
        let by_teacher = self
            .work
            .teacher_instruments
            .values()
            .any(|ids| ids.contains(&id));
        Ok(by_package || by_teacher)
    }

    async fn package(&mut self, id: Uuid) -> BookingResult<Option<Package>> {
        Ok(self.work.packages.get(&id).cloned())
    }

    async fn package_by_name(&mut self, name: &str) -> BookingResult<Option<Package>> {
        Ok(self
            .work
            .packages
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_packages(&mut self) -> BookingResult<Vec<Package>> {
        let mut packages: Vec<_> = self.work.packages.values().cloned().collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(packages)
    }

    async fn insert_package(&mut self, package: &Package) -> BookingResult<()> {
        if self
            .work
            .packages
            .values()
            .any(|p| p.name.eq_ignore_ascii_case(&package.name))
        {
            return Err(BookingError::Conflict(format!(
                "Package '{}' already exists",
                package.name
            )));
        }
        self.work.packages.insert(package.id, package.clone());
        Ok(())
    }

    async fn update_package(&mut self, package: &Package) -> BookingResult<()> {
        match self.work.packages.get_mut(&package.id) {
            Some(existing) => {
                *existing = package.clone();
                Ok(())
            }
            None => Err(missing("Package", package.id)),
        }
    }

    async fn delete_package(&mut self, id: Uuid) -> BookingResult<()> {
        self.work.packages.remove(&id);
        Ok(())
    }

    async fn package_in_use(&mut self, id: Uuid) -> BookingResult<bool> {
        Ok(self
            .work
            .student_packages
            .values()
            .any(|sp| sp.package_id == id))
    }

    async fn teacher_instruments(&mut self, teacher_id: Uuid) -> BookingResult<Vec<Uuid>> {
        Ok(self
            .work
            .teacher_instruments
            .get(&teacher_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_teacher_instruments(
        &mut self,
        teacher_id: Uuid,
        instrument_ids: &[Uuid],
    ) -> BookingResult<()> {
        let mut ids = instrument_ids.to_vec();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            self.work.teacher_instruments.remove(&teacher_id);
        } else {
            self.work.teacher_instruments.insert(teacher_id, ids);
        }
        Ok(())
    }

    async fn schedule(&mut self, id: Uuid) -> BookingResult<Option<TeacherSchedule>> {
        Ok(self.work.schedules.get(&id).cloned())
    }

    async fn schedule_for_update(&mut self, id: Uuid) -> BookingResult<Option<TeacherSchedule>> {
        Ok(self.work.schedules.get(&id).cloned())
    }

    async fn schedules_for_teacher(&mut self, teacher_id: Uuid) -> BookingResult<Vec<TeacherSchedule>> {
        let mut schedules: Vec<_> = self
            .work
            .schedules
            .values()
            .filter(|s| s.teacher_id == teacher_id)
            .cloned()
            .collect();
        sort_schedules(&mut schedules);
        Ok(schedules)
    }

    async fn free_schedules_for_instruments(
        &mut self,
        instrument_ids: &[Uuid],
    ) -> BookingResult<Vec<TeacherSchedule>> {
        let teachers: Vec<Uuid> = self
            .work
            .teacher_instruments
            .iter()
            .filter(|(_, ids)| ids.iter().any(|id| instrument_ids.contains(id)))
            .map(|(teacher_id, _)| *teacher_id)
            .collect();

        let mut schedules: Vec<_> = self
            .work
            .schedules
            .values()
            .filter(|s| !s.is_booked && teachers.contains(&s.teacher_id))
            .cloned()
            .collect();
        sort_schedules(&mut schedules);
        Ok(schedules)
    }

    async fn insert_schedule(&mut self, schedule: &TeacherSchedule) -> BookingResult<()> {
        self.work.schedules.insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn set_schedule_booked(&mut self, id: Uuid, is_booked: bool) -> BookingResult<()> {
        match self.work.schedules.get_mut(&id) {
            Some(schedule) => {
                schedule.is_booked = is_booked;
                Ok(())
            }
            None => Err(missing("Schedule", id)),
        }
    }

    async fn delete_schedule(&mut self, id: Uuid) -> BookingResult<()> {
        if let Some(schedule) = self.work.schedules.remove(&id) {
            self.work.retired_schedules.insert(id, schedule);
        }
        Ok(())
    }

    async fn schedule_has_history(&mut self, id: Uuid) -> BookingResult<bool> {
        let bookings = &self.work.bookings;
        Ok(self.work.histories.values().any(|h| {
            bookings
                .get(&h.booking_id)
                .is_some_and(|b| b.schedule_id == id)
        }))
    }

    async fn student_packages(&mut self, student_id: Uuid) -> BookingResult<Vec<StudentPackage>> {
        Ok(self.entries_of(student_id))
    }

    async fn student_packages_for_update(
        &mut self,
        student_id: Uuid,
    ) -> BookingResult<Vec<StudentPackage>> {
        Ok(self.entries_of(student_id))
    }

    async fn student_package_for_update(&mut self, id: Uuid) -> BookingResult<Option<StudentPackage>> {
        Ok(self.work.student_packages.get(&id).cloned())
    }

    async fn insert_student_package(&mut self, entry: &StudentPackage) -> BookingResult<()> {
        if entry.remaining_quota < 0 {
            return Err(BookingError::Storage(eyre!(
                "remaining_quota must not be negative"
            )));
        }
        self.work.student_packages.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn set_remaining_quota(&mut self, id: Uuid, remaining_quota: i32) -> BookingResult<()> {
        if remaining_quota < 0 {
            return Err(BookingError::Storage(eyre!(
                "remaining_quota must not be negative"
            )));
        }
        match self.work.student_packages.get_mut(&id) {
            Some(entry) => {
                entry.remaining_quota = remaining_quota;
                Ok(())
            }
            None => Err(missing("Student package", id)),
        }
    }

    async fn booking_for_update(&mut self, id: Uuid) -> BookingResult<Option<Booking>> {
        Ok(self.work.bookings.get(&id).cloned())
    }

    async fn bookings_for_student(&mut self, student_id: Uuid) -> BookingResult<Vec<Booking>> {
        let mut bookings: Vec<_> = self
            .work
            .bookings
            .values()
            .filter(|b| b.student_id == student_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
        Ok(bookings)
    }

    async fn bookings_for_teacher(&mut self, teacher_id: Uuid) -> BookingResult<Vec<Booking>> {
        let mut bookings: Vec<_> = self
            .work
            .bookings
            .values()
            .filter(|b| self.teacher_of(b.schedule_id) == Some(teacher_id))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
        Ok(bookings)
    }

    async fn insert_booking(&mut self, booking: &Booking) -> BookingResult<()> {
        if booking.status == BookingStatus::Booked
            && self.work.bookings.values().any(|b| {
                b.schedule_id == booking.schedule_id && b.status == BookingStatus::Booked
            })
        {
            return Err(BookingError::Conflict(format!(
                "Schedule {} already has an active booking",
                booking.schedule_id
            )));
        }
        self.work.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn update_booking(&mut self, booking: &Booking) -> BookingResult<()> {
        match self.work.bookings.get_mut(&booking.id) {
            Some(existing) => {
                *existing = booking.clone();
                Ok(())
            }
            None => Err(missing("Booking", booking.id)),
        }
    }

    async fn booked_instrument_names_at(
        &mut self,
        class_date: NaiveDate,
        start_time: NaiveTime,
    ) -> BookingResult<Vec<String>> {
        let work = &self.work;
        Ok(work
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::Booked && b.class_date == class_date)
            .filter(|b| {
                work.schedules
                    .get(&b.schedule_id)
                    .or_else(|| work.retired_schedules.get(&b.schedule_id))
                    .is_some_and(|s| s.start_time == start_time)
            })
            .filter_map(|b| work.student_packages.get(&b.student_package_id))
            .filter_map(|entry| work.packages.get(&entry.package_id))
            .filter_map(|package| work.instruments.get(&package.instrument_id))
            .map(|instrument| instrument.name.clone())
            .collect())
    }

    async fn insert_class_history(&mut self, history: &ClassHistory) -> BookingResult<()> {
        if self
            .work
            .histories
            .values()
            .any(|h| h.booking_id == history.booking_id)
        {
            return Err(BookingError::Duplicate(format!(
                "Class history for booking {} already recorded",
                history.booking_id
            )));
        }
        self.work.histories.insert(history.id, history.clone());
        Ok(())
    }

    async fn class_history_for_update(&mut self, id: Uuid) -> BookingResult<Option<ClassHistory>> {
        Ok(self.work.histories.get(&id).cloned())
    }

    async fn class_history_by_booking(
        &mut self,
        booking_id: Uuid,
    ) -> BookingResult<Option<ClassHistory>> {
        Ok(self
            .work
            .histories
            .values()
            .find(|h| h.booking_id == booking_id)
            .cloned())
    }

    async fn histories_for_student(&mut self, student_id: Uuid) -> BookingResult<Vec<ClassHistory>> {
        let mut histories: Vec<_> = self
            .work
            .histories
            .values()
            .filter(|h| h.student_id == student_id)
            .cloned()
            .collect();
        sort_histories(&mut histories);
        Ok(histories)
    }

    async fn histories_for_teacher(&mut self, teacher_id: Uuid) -> BookingResult<Vec<ClassHistory>> {
        let mut histories: Vec<_> = self
            .work
            .histories
            .values()
            .filter(|h| h.teacher_id == teacher_id)
            .cloned()
            .collect();
        sort_histories(&mut histories);
        Ok(histories)
    }

    async fn list_histories(&mut self) -> BookingResult<Vec<ClassHistory>> {
        let mut histories: Vec<_> = self.work.histories.values().cloned().collect();
        sort_histories(&mut histories);
        Ok(histories)
    }

    async fn insert_documentation(&mut self, documentation: &ClassDocumentation) -> BookingResult<()> {
        match self.work.histories.get_mut(&documentation.class_history_id) {
            Some(history) => {
                history.documentations.push(documentation.clone());
                Ok(())
            }
            None => Err(missing("Class history", documentation.class_history_id)),
        }
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }
}
