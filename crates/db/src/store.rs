//! PostgreSQL implementation of the core [`Store`] interface.
//!
//! One [`PgTx`] wraps one database transaction. `_for_update` reads use
//! `SELECT ... FOR UPDATE`; [`StoreTx::lock_user`] and
//! [`StoreTx::lock_timeslot`] take transaction-scoped advisory locks.
//! Unique-index violations come back as the domain errors the services
//! expect.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use eyre::eyre;
use lessonbook_core::{
    errors::{BookingError, BookingResult},
    models::{
        booking::Booking,
        catalog::{Instrument, Package},
        history::{ClassDocumentation, ClassHistory},
        quota::StudentPackage,
        schedule::TeacherSchedule,
    },
    store::{Store, StoreTx},
};
use sqlx::{PgConnection, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    DbPool,
    models::DbClassHistory,
    repositories::{booking, catalog, history, quota, schedule},
};

const ACTIVE_BOOKING_INDEX: &str = "idx_bookings_active_schedule";
const HISTORY_BOOKING_INDEX: &str = "idx_class_histories_booking_id";
const INSTRUMENT_NAME_INDEX: &str = "idx_instruments_name";
const PACKAGE_NAME_INDEX: &str = "idx_packages_name";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> BookingResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await.map_err(|e| BookingError::Storage(e.into()))?;
        Ok(Box::new(PgTx { tx }))
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

/// Name of the unique index a failed statement violated, if that is what
/// went wrong.
fn violated_unique_index(report: &eyre::Report) -> Option<String> {
    let db_err = report.downcast_ref::<sqlx::Error>()?.as_database_error()?;
    if db_err.code().as_deref() == Some("23505") {
        db_err.constraint().map(str::to_string)
    } else {
        None
    }
}

fn storage(report: eyre::Report) -> BookingError {
    BookingError::Storage(report)
}

fn missing(what: &str, id: Uuid) -> BookingError {
    BookingError::Storage(eyre!("{} {} does not exist", what, id))
}

impl PgTx {
    fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    /// Loads the attachments of `rows` and assembles full histories.
    async fn with_documentations(&mut self, rows: Vec<DbClassHistory>) -> BookingResult<Vec<ClassHistory>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut grouped: HashMap<Uuid, Vec<ClassDocumentation>> = HashMap::new();
        for doc in history::get_documentations(self.conn(), &ids).await.map_err(storage)? {
            grouped
                .entry(doc.class_history_id)
                .or_default()
                .push(doc.into());
        }
        rows.into_iter()
            .map(|row| {
                let docs = grouped.remove(&row.id).unwrap_or_default();
                row.into_history(docs)
            })
            .collect()
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn lock_user(&mut self, user_id: Uuid) -> BookingResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(user_id)
            .execute(self.conn())
            .await
            .map_err(|e| BookingError::Storage(e.into()))?;
        Ok(())
    }

    async fn lock_timeslot(&mut self, class_date: NaiveDate, start_time: NaiveTime) -> BookingResult<()> {
        // two-key form, so it never collides with a user lock
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('timeslot'), hashtext($1::text || ' ' || $2::text))")
            .bind(class_date)
            .bind(start_time)
            .execute(self.conn())
            .await
            .map_err(|e| BookingError::Storage(e.into()))?;
        Ok(())
    }

    async fn instrument(&mut self, id: Uuid) -> BookingResult<Option<Instrument>> {
        let row = catalog::get_instrument(self.conn(), id).await.map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn instrument_by_name(&mut self, name: &str) -> BookingResult<Option<Instrument>> {
        let row = catalog::get_instrument_by_name(self.conn(), name)
            .await
            .map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn list_instruments(&mut self) -> BookingResult<Vec<Instrument>> {
        let rows = catalog::list_instruments(self.conn()).await.map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_instrument(&mut self, instrument: &Instrument) -> BookingResult<()> {
        catalog::insert_instrument(self.conn(), instrument)
            .await
            .map_err(|report| match violated_unique_index(&report) {
                Some(index) if index == INSTRUMENT_NAME_INDEX => BookingError::Conflict(format!(
                    "Instrument '{}' already exists",
                    instrument.name
                )),
                _ => storage(report),
            })
    }

    async fn update_instrument(&mut self, instrument: &Instrument) -> BookingResult<()> {
        catalog::update_instrument(self.conn(), instrument)
            .await
            .map_err(|report| match violated_unique_index(&report) {
                Some(index) if index == INSTRUMENT_NAME_INDEX => BookingError::Conflict(format!(
                    "Instrument '{}' already exists",
                    instrument.name
                )),
                _ => storage(report),
            })
    }

    async fn delete_instrument(&mut self, id: Uuid) -> BookingResult<()> {
        catalog::delete_instrument(self.conn(), id).await.map_err(storage)
    }

    async fn instrument_in_use(&mut self, id: Uuid) -> BookingResult<bool> {
        catalog::instrument_in_use(self.conn(), id).await.map_err(storage)
    }

    async fn package(&mut self, id: Uuid) -> BookingResult<Option<Package>> {
        let row = catalog::get_package(self.conn(), id).await.map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn package_by_name(&mut self, name: &str) -> BookingResult<Option<Package>> {
        let row = catalog::get_package_by_name(self.conn(), name)
            .await
            .map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn list_packages(&mut self) -> BookingResult<Vec<Package>> {
        let rows = catalog::list_packages(self.conn()).await.map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_package(&mut self, package: &Package) -> BookingResult<()> {
        catalog::insert_package(self.conn(), package)
            .await
            .map_err(|report| match violated_unique_index(&report) {
                Some(index) if index == PACKAGE_NAME_INDEX => {
                    BookingError::Conflict(format!("Package '{}' already exists", package.name))
                }
                _ => storage(report),
            })
    }

    async fn update_package(&mut self, package: &Package) -> BookingResult<()> {
        catalog::update_package(self.conn(), package)
            .await
            .map_err(|report| match violated_unique_index(&report) {
                Some(index) if index == PACKAGE_NAME_INDEX => {
                    BookingError::Conflict(format!("Package '{}' already exists", package.name))
                }
                _ => storage(report),
            })
    }

    async fn delete_package(&mut self, id: Uuid) -> BookingResult<()> {
        catalog::delete_package(self.conn(), id).await.map_err(storage)
    }

    async fn package_in_use(&mut self, id: Uuid) -> BookingResult<bool> {
        catalog::package_in_use(self.conn(), id).await.map_err(storage)
    }

    async fn teacher_instruments(&mut self, teacher_id: Uuid) -> BookingResult<Vec<Uuid>> {
        catalog::get_teacher_instruments(self.conn(), teacher_id)
            .await
            .map_err(storage)
    }

    async fn set_teacher_instruments(
        &mut self,
        teacher_id: Uuid,
        instrument_ids: &[Uuid],
    ) -> BookingResult<()> {
        catalog::replace_teacher_instruments(self.conn(), teacher_id, instrument_ids)
            .await
            .map_err(storage)
    }

    async fn schedule(&mut self, id: Uuid) -> BookingResult<Option<TeacherSchedule>> {
        schedule::get_schedule(self.conn(), id)
            .await
            .map_err(storage)?
            .map(TeacherSchedule::try_from)
            .transpose()
    }

    async fn schedule_for_update(&mut self, id: Uuid) -> BookingResult<Option<TeacherSchedule>> {
        schedule::lock_schedule(self.conn(), id)
            .await
            .map_err(storage)?
            .map(TeacherSchedule::try_from)
            .transpose()
    }

    async fn schedules_for_teacher(&mut self, teacher_id: Uuid) -> BookingResult<Vec<TeacherSchedule>> {
        schedule::get_schedules_by_teacher(self.conn(), teacher_id)
            .await
            .map_err(storage)?
            .into_iter()
            .map(TeacherSchedule::try_from)
            .collect()
    }

    async fn free_schedules_for_instruments(
        &mut self,
        instrument_ids: &[Uuid],
    ) -> BookingResult<Vec<TeacherSchedule>> {
        schedule::get_free_schedules_for_instruments(self.conn(), instrument_ids)
            .await
            .map_err(storage)?
            .into_iter()
            .map(TeacherSchedule::try_from)
            .collect()
    }

    async fn insert_schedule(&mut self, slot: &TeacherSchedule) -> BookingResult<()> {
        schedule::insert_schedule(self.conn(), slot)
            .await
            .map_err(storage)
    }

    async fn set_schedule_booked(&mut self, id: Uuid, is_booked: bool) -> BookingResult<()> {
        if schedule::set_schedule_booked(self.conn(), id, is_booked)
            .await
            .map_err(storage)?
        {
            Ok(())
        } else {
            Err(missing("Schedule", id))
        }
    }

    async fn delete_schedule(&mut self, id: Uuid) -> BookingResult<()> {
        schedule::retire_schedule(self.conn(), id).await.map_err(storage)
    }

    async fn schedule_has_history(&mut self, id: Uuid) -> BookingResult<bool> {
        schedule::schedule_has_history(self.conn(), id)
            .await
            .map_err(storage)
    }

    async fn student_packages(&mut self, student_id: Uuid) -> BookingResult<Vec<StudentPackage>> {
        let rows = quota::get_student_packages(self.conn(), student_id)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn student_packages_for_update(
        &mut self,
        student_id: Uuid,
    ) -> BookingResult<Vec<StudentPackage>> {
        let rows = quota::lock_student_packages(self.conn(), student_id)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn student_package_for_update(&mut self, id: Uuid) -> BookingResult<Option<StudentPackage>> {
        let row = quota::lock_student_package(self.conn(), id)
            .await
            .map_err(storage)?;
        Ok(row.map(Into::into))
    }

    async fn insert_student_package(&mut self, entry: &StudentPackage) -> BookingResult<()> {
        quota::insert_student_package(self.conn(), entry)
            .await
            .map_err(storage)
    }

    async fn set_remaining_quota(&mut self, id: Uuid, remaining_quota: i32) -> BookingResult<()> {
        if quota::set_remaining_quota(self.conn(), id, remaining_quota)
            .await
            .map_err(storage)?
        {
            Ok(())
        } else {
            Err(missing("Student package", id))
        }
    }

    async fn booking_for_update(&mut self, id: Uuid) -> BookingResult<Option<Booking>> {
        booking::lock_booking(self.conn(), id)
            .await
            .map_err(storage)?
            .map(Booking::try_from)
            .transpose()
    }

    async fn bookings_for_student(&mut self, student_id: Uuid) -> BookingResult<Vec<Booking>> {
        booking::get_bookings_by_student(self.conn(), student_id)
            .await
            .map_err(storage)?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn bookings_for_teacher(&mut self, teacher_id: Uuid) -> BookingResult<Vec<Booking>> {
        booking::get_bookings_by_teacher(self.conn(), teacher_id)
            .await
            .map_err(storage)?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn insert_booking(&mut self, record: &Booking) -> BookingResult<()> {
        booking::insert_booking(self.conn(), record)
            .await
            .map_err(|report| match violated_unique_index(&report) {
                Some(index) if index == ACTIVE_BOOKING_INDEX => BookingError::Conflict(format!(
                    "Schedule {} already has an active booking",
                    record.schedule_id
                )),
                _ => storage(report),
            })
    }

    async fn update_booking(&mut self, record: &Booking) -> BookingResult<()> {
        if booking::update_booking(self.conn(), record)
            .await
            .map_err(storage)?
        {
            Ok(())
        } else {
            Err(missing("Booking", record.id))
        }
    }

    async fn booked_instrument_names_at(
        &mut self,
        class_date: NaiveDate,
        start_time: NaiveTime,
    ) -> BookingResult<Vec<String>> {
        booking::get_booked_instrument_names_at(self.conn(), class_date, start_time)
            .await
            .map_err(storage)
    }

    async fn insert_class_history(&mut self, record: &ClassHistory) -> BookingResult<()> {
        history::insert_class_history(self.conn(), record)
            .await
            .map_err(|report| match violated_unique_index(&report) {
                Some(index) if index == HISTORY_BOOKING_INDEX => BookingError::Duplicate(format!(
                    "Class history for booking {} already recorded",
                    record.booking_id
                )),
                _ => storage(report),
            })
    }

    async fn class_history_for_update(&mut self, id: Uuid) -> BookingResult<Option<ClassHistory>> {
        let Some(row) = history::lock_class_history(self.conn(), id)
            .await
            .map_err(storage)?
        else {
            return Ok(None);
        };
        Ok(self.with_documentations(vec![row]).await?.pop())
    }

    async fn class_history_by_booking(
        &mut self,
        booking_id: Uuid,
    ) -> BookingResult<Option<ClassHistory>> {
        let Some(row) = history::get_class_history_by_booking(self.conn(), booking_id)
            .await
            .map_err(storage)?
        else {
            return Ok(None);
        };
        Ok(self.with_documentations(vec![row]).await?.pop())
    }

    async fn histories_for_student(&mut self, student_id: Uuid) -> BookingResult<Vec<ClassHistory>> {
        let rows = history::get_histories_by_student(self.conn(), student_id)
            .await
            .map_err(storage)?;
        self.with_documentations(rows).await
    }

    async fn histories_for_teacher(&mut self, teacher_id: Uuid) -> BookingResult<Vec<ClassHistory>> {
        let rows = history::get_histories_by_teacher(self.conn(), teacher_id)
            .await
            .map_err(storage)?;
        self.with_documentations(rows).await
    }

    async fn list_histories(&mut self) -> BookingResult<Vec<ClassHistory>> {
        let rows = history::get_all_histories(self.conn()).await.map_err(storage)?;
        self.with_documentations(rows).await
    }

    async fn insert_documentation(&mut self, documentation: &ClassDocumentation) -> BookingResult<()> {
        history::insert_documentation(self.conn(), documentation)
            .await
            .map_err(storage)
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| BookingError::Storage(e.into()))
    }
}
