//! # Booking engine
//!
//! Binds a student, one quota unit and one availability slot into a
//! [`Booking`], and drives it through `booked → completed | cancelled |
//! rescheduled`. Every transition runs in a single store transaction: the
//! slot flag, the quota counter and the booking row change together or not
//! at all.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    models::{
        booking::{Booking, BookingStatus, CreateBookingRequest, FinishClassRequest},
        catalog::Package,
        history::ClassHistory,
        identity::{Identity, Role},
        schedule::TeacherSchedule,
    },
    policy::{LedgerPolicy, RoomLimits},
    services::{availability, history, quota},
    store::{Store, StoreTx},
};

fn booking_not_found(id: Uuid) -> BookingError {
    BookingError::NotFound(format!("Booking with ID {} not found", id))
}

fn schedule_not_found(id: Uuid) -> BookingError {
    BookingError::NotFound(format!("Schedule with ID {} not found", id))
}

async fn lock_schedule(tx: &mut dyn StoreTx, id: Uuid) -> BookingResult<TeacherSchedule> {
    tx.schedule_for_update(id)
        .await?
        .ok_or_else(|| schedule_not_found(id))
}

async fn package_of_entry(tx: &mut dyn StoreTx, entry_id: Uuid) -> BookingResult<Package> {
    let entry = tx.student_package_for_update(entry_id).await?.ok_or_else(|| {
        BookingError::Storage(eyre::eyre!("Student package {} does not exist", entry_id))
    })?;
    tx.package(entry.package_id).await?.ok_or_else(|| {
        BookingError::Storage(eyre::eyre!("Package {} does not exist", entry.package_id))
    })
}

/// Fails with `Conflict` if the student already has a booked lesson at a
/// time overlapping `slot`.
async fn ensure_student_free(
    tx: &mut dyn StoreTx,
    student_id: Uuid,
    slot: &TeacherSchedule,
    ignore_booking: Option<Uuid>,
) -> BookingResult<()> {
    for booking in tx.bookings_for_student(student_id).await? {
        if booking.status != BookingStatus::Booked || Some(booking.id) == ignore_booking {
            continue;
        }
        if let Some(other) = tx.schedule(booking.schedule_id).await? {
            if other.overlaps_slot(slot) {
                return Err(BookingError::Conflict(format!(
                    "Student already has a lesson on {} {}-{}",
                    other.day_of_week,
                    other.start_time.format("%H:%M"),
                    other.end_time.format("%H:%M")
                )));
            }
        }
    }
    Ok(())
}

/// Fails with `Conflict` once the room kind `package` needs is full at the
/// slot's date and start time.
async fn ensure_room(
    tx: &mut dyn StoreTx,
    policy: &LedgerPolicy,
    class_date: NaiveDate,
    slot: &TeacherSchedule,
    package: &Package,
) -> BookingResult<()> {
    let instrument = tx.instrument(package.instrument_id).await?.ok_or_else(|| {
        BookingError::Storage(eyre::eyre!("Instrument {} does not exist", package.instrument_id))
    })?;
    tx.lock_timeslot(class_date, slot.start_time).await?;

    let drum = RoomLimits::is_drum(&instrument.name);
    let limit = policy.room_limits.limit_for(&instrument.name);
    let taken = tx
        .booked_instrument_names_at(class_date, slot.start_time)
        .await?
        .iter()
        .filter(|name| RoomLimits::is_drum(name) == drum)
        .count();
    if taken as u32 >= limit {
        warn!(
            "Booking rejected, rooms full: class_date={}, start={}, drum={}, taken={}",
            class_date,
            slot.start_time.format("%H:%M"),
            drum,
            taken
        );
        return Err(BookingError::Conflict(format!(
            "No {} room left on {} at {}",
            if drum { "drum" } else { "lesson" },
            class_date,
            slot.start_time.format("%H:%M")
        )));
    }
    Ok(())
}

/// Books a free slot for the acting student, charging one lesson to the
/// soonest-expiring package that covers it.
pub async fn create_booking(
    store: &dyn Store,
    policy: &LedgerPolicy,
    actor: &Identity,
    request: &CreateBookingRequest,
) -> BookingResult<Booking> {
    actor.require(&[Role::Student])?;
    let student_id = actor.user_id;
    let now = Utc::now();

    let mut tx = store.begin().await?;
    let schedule = lock_schedule(tx.as_mut(), request.schedule_id).await?;
    if schedule.is_booked {
        warn!(
            "Booking rejected, slot taken: schedule_id={}, student_id={}",
            schedule.id, student_id
        );
        return Err(BookingError::Conflict(format!(
            "Schedule {} is already booked",
            schedule.id
        )));
    }

    let taught = tx.teacher_instruments(schedule.teacher_id).await?;
    let instruments = match request.instrument_id {
        Some(id) if taught.contains(&id) => vec![id],
        Some(id) => {
            return Err(BookingError::Validation(format!(
                "Teacher of schedule {} does not teach instrument {}",
                schedule.id, id
            )));
        }
        None => taught,
    };

    let minutes = schedule.duration_minutes();
    tx.lock_user(student_id).await?;
    let mut covering = Vec::new();
    for entry in tx.student_packages_for_update(student_id).await? {
        let covers = tx.package(entry.package_id).await?.is_some_and(|p| {
            instruments.contains(&p.instrument_id) && p.duration_minutes == minutes
        });
        if covers {
            covering.push(entry);
        }
    }
    let entry = quota::pick_entry(covering, now)?;
    let package = tx.package(entry.package_id).await?.ok_or_else(|| {
        BookingError::Storage(eyre::eyre!("Package {} does not exist", entry.package_id))
    })?;

    ensure_student_free(tx.as_mut(), student_id, &schedule, None).await?;
    let class_date = policy.next_class_date(schedule.day_of_week, schedule.start_time, now);
    ensure_room(tx.as_mut(), policy, class_date, &schedule, &package).await?;

    availability::reserve(tx.as_mut(), &schedule).await?;
    let entry = quota::consume_entry(tx.as_mut(), &entry).await?;
    let booking = Booking::new(student_id, schedule.id, entry.id, class_date, now);
    tx.insert_booking(&booking).await?;
    tx.commit().await?;

    info!(
        "Booking created: id={}, student_id={}, schedule_id={}, class_date={}, remaining_quota={}",
        booking.id, student_id, schedule.id, class_date, entry.remaining_quota
    );
    Ok(booking)
}

/// Cancels a booked lesson. The slot's teacher and admins may cancel at any
/// time; the booking's student only while the lesson is at least the
/// policy's notice period away. The slot becomes free and the lesson goes
/// back to the student's package.
pub async fn cancel_booking(
    store: &dyn Store,
    policy: &LedgerPolicy,
    actor: &Identity,
    booking_id: Uuid,
    reason: Option<String>,
) -> BookingResult<Booking> {
    actor.require(&[Role::Teacher, Role::Admin, Role::Student])?;
    let now = Utc::now();

    let mut tx = store.begin().await?;
    let mut booking = tx
        .booking_for_update(booking_id)
        .await?
        .filter(|b| actor.role != Role::Student || b.student_id == actor.user_id)
        .ok_or_else(|| booking_not_found(booking_id))?;
    let schedule = tx
        .schedule_for_update(booking.schedule_id)
        .await?
        .filter(|s| actor.role != Role::Teacher || s.teacher_id == actor.user_id)
        .ok_or_else(|| booking_not_found(booking_id))?;

    booking.cancel(now, actor.user_id, reason).inspect_err(|e| {
        warn!("Cancel rejected: booking_id={}, {}", booking_id, e);
    })?;
    if actor.role == Role::Student {
        let starts_at = policy.class_start(booking.class_date, schedule.start_time);
        if !policy.allows_student_cancel(starts_at, now) {
            warn!(
                "Cancel rejected, too late: booking_id={}, starts_at={}",
                booking_id, starts_at
            );
            return Err(BookingError::InvalidState(format!(
                "Lessons can only be cancelled at least {} hours before they start",
                policy.cancellation_notice_hours
            )));
        }
    }

    tx.update_booking(&booking).await?;
    availability::release(tx.as_mut(), schedule.id).await?;
    let entry = quota::restore_entry(tx.as_mut(), booking.student_package_id).await?;
    tx.commit().await?;

    info!(
        "Booking cancelled: id={}, by={}, remaining_quota={}",
        booking.id, actor.user_id, entry.remaining_quota
    );
    Ok(booking)
}

/// Completes a booked lesson and archives it.
pub async fn finish_class(
    store: &dyn Store,
    actor: &Identity,
    booking_id: Uuid,
    request: FinishClassRequest,
) -> BookingResult<ClassHistory> {
    actor.require(&[Role::Teacher])?;
    let now = Utc::now();

    let mut tx = store.begin().await?;
    let mut booking = tx
        .booking_for_update(booking_id)
        .await?
        .ok_or_else(|| booking_not_found(booking_id))?;
    let schedule = tx
        .schedule_for_update(booking.schedule_id)
        .await?
        .filter(|s| s.teacher_id == actor.user_id)
        .ok_or_else(|| booking_not_found(booking_id))?;

    booking.complete(now)?;
    let urls = request
        .documentation_urls
        .iter()
        .map(|url| history::validate_documentation_url(url))
        .collect::<BookingResult<Vec<_>>>()?;

    tx.update_booking(&booking).await?;
    availability::release(tx.as_mut(), schedule.id).await?;
    let package = package_of_entry(tx.as_mut(), booking.student_package_id).await?;
    let archived = history::record_completion(
        tx.as_mut(),
        &booking,
        &schedule,
        &package,
        request.notes,
        urls,
        now,
    )
    .await?;
    tx.commit().await?;

    info!(
        "Class finished: booking_id={}, history_id={}, documents={}",
        booking.id,
        archived.id,
        archived.documentations.len()
    );
    Ok(archived)
}

/// Moves a booked lesson to another free slot. The old booking ends as
/// `rescheduled` and a new one is charged to the same package entry, so the
/// student's quota does not change.
pub async fn reschedule_booking(
    store: &dyn Store,
    policy: &LedgerPolicy,
    actor: &Identity,
    booking_id: Uuid,
    new_schedule_id: Uuid,
) -> BookingResult<Booking> {
    actor.require(&[Role::Student, Role::Admin])?;
    let now = Utc::now();

    let mut tx = store.begin().await?;
    let mut old = tx
        .booking_for_update(booking_id)
        .await?
        .filter(|b| actor.is_admin() || b.student_id == actor.user_id)
        .ok_or_else(|| booking_not_found(booking_id))?;
    old.mark_rescheduled(now)?;

    if new_schedule_id == old.schedule_id {
        return Err(BookingError::Conflict(
            "Booking is already on this schedule".to_string(),
        ));
    }

    let (current, target) = lock_schedule_pair(tx.as_mut(), old.schedule_id, new_schedule_id).await?;
    let target = target.ok_or_else(|| schedule_not_found(new_schedule_id))?;
    if target.is_booked {
        return Err(BookingError::Conflict(format!(
            "Schedule {} is already booked",
            target.id
        )));
    }

    // same order as create_booking: user lock, then the ledger entry
    tx.lock_user(old.student_id).await?;
    let package = package_of_entry(tx.as_mut(), old.student_package_id).await?;
    if !tx
        .teacher_instruments(target.teacher_id)
        .await?
        .contains(&package.instrument_id)
    {
        return Err(BookingError::Validation(format!(
            "Teacher of schedule {} does not teach instrument {}",
            target.id, package.instrument_id
        )));
    }
    if target.duration_minutes() != package.duration_minutes {
        return Err(BookingError::Validation(format!(
            "Schedule {} lasts {} minutes, the package's lessons last {}",
            target.id,
            target.duration_minutes(),
            package.duration_minutes
        )));
    }

    ensure_student_free(tx.as_mut(), old.student_id, &target, Some(old.id)).await?;

    tx.update_booking(&old).await?;
    let class_date = policy.next_class_date(target.day_of_week, target.start_time, now);
    ensure_room(tx.as_mut(), policy, class_date, &target, &package).await?;
    if current.is_some() {
        availability::release(tx.as_mut(), old.schedule_id).await?;
    }
    availability::reserve(tx.as_mut(), &target).await?;
    let booking = Booking::new(old.student_id, target.id, old.student_package_id, class_date, now);
    tx.insert_booking(&booking).await?;
    tx.commit().await?;

    info!(
        "Booking rescheduled: old_id={}, new_id={}, schedule {} -> {}",
        old.id, booking.id, old.schedule_id, target.id
    );
    Ok(booking)
}

/// Locks two slots in id order so concurrent reschedules cannot deadlock.
async fn lock_schedule_pair(
    tx: &mut dyn StoreTx,
    current_id: Uuid,
    target_id: Uuid,
) -> BookingResult<(Option<TeacherSchedule>, Option<TeacherSchedule>)> {
    if current_id < target_id {
        let current = tx.schedule_for_update(current_id).await?;
        let target = tx.schedule_for_update(target_id).await?;
        Ok((current, target))
    } else {
        let target = tx.schedule_for_update(target_id).await?;
        let current = tx.schedule_for_update(current_id).await?;
        Ok((current, target))
    }
}

/// Newest first.
pub async fn student_bookings(store: &dyn Store, student_id: Uuid) -> BookingResult<Vec<Booking>> {
    let mut tx = store.begin().await?;
    tx.bookings_for_student(student_id).await
}

/// Bookings on the teacher's slots, newest first.
pub async fn teacher_bookings(store: &dyn Store, teacher_id: Uuid) -> BookingResult<Vec<Booking>> {
    let mut tx = store.begin().await?;
    tx.bookings_for_teacher(teacher_id).await
}
