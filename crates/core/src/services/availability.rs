//! Availability ledger: recurring weekly slots declared by teachers.

use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    models::{
        identity::{Identity, Role},
        schedule::{
            AddAvailabilityRequest, AvailableSlot, DayOfWeek, DayRange, DeletedDayResponse,
            TeacherSchedule, parse_wall_time,
        },
    },
    policy::LedgerPolicy,
    store::{Store, StoreTx},
};

pub async fn add_availability(
    store: &dyn Store,
    actor: &Identity,
    request: &AddAvailabilityRequest,
) -> BookingResult<TeacherSchedule> {
    actor.require(&[Role::Teacher])?;

    let day: DayOfWeek = request.day_of_week.parse()?;
    let start_time = parse_wall_time(&request.start_time)?;
    let end_time = parse_wall_time(&request.end_time)?;
    if start_time >= end_time {
        return Err(BookingError::Validation(
            "Start time must be before end time".to_string(),
        ));
    }

    let mut tx = store.begin().await?;
    tx.lock_user(actor.user_id).await?;

    let existing = tx.schedules_for_teacher(actor.user_id).await?;
    if let Some(clash) = existing
        .iter()
        .find(|s| s.overlaps(day, start_time, end_time))
    {
        warn!(
            "Availability overlaps existing slot: teacher_id={}, schedule_id={}",
            actor.user_id, clash.id
        );
        return Err(BookingError::Conflict(format!(
            "Slot overlaps existing availability on {} {}-{}",
            clash.day_of_week,
            clash.start_time.format("%H:%M"),
            clash.end_time.format("%H:%M")
        )));
    }

    let schedule = TeacherSchedule {
        id: Uuid::new_v4(),
        teacher_id: actor.user_id,
        day_of_week: day,
        start_time,
        end_time,
        is_booked: false,
        created_at: Utc::now(),
    };
    tx.insert_schedule(&schedule).await?;
    tx.commit().await?;

    info!(
        "Availability added: id={}, teacher_id={}, day={}, {}-{}",
        schedule.id,
        schedule.teacher_id,
        schedule.day_of_week,
        schedule.start_time.format("%H:%M"),
        schedule.end_time.format("%H:%M")
    );
    Ok(schedule)
}

/// Removes a slot owned by the acting teacher. A booked slot has to be
/// cancelled first; a slot with archived lessons stays.
pub async fn delete_availability(
    store: &dyn Store,
    actor: &Identity,
    schedule_id: Uuid,
) -> BookingResult<()> {
    actor.require(&[Role::Teacher])?;

    let mut tx = store.begin().await?;
    let schedule = tx
        .schedule_for_update(schedule_id)
        .await?
        .filter(|s| s.teacher_id == actor.user_id)
        .ok_or_else(|| {
            BookingError::NotFound(format!("Schedule with ID {} not found", schedule_id))
        })?;

    if schedule.is_booked {
        return Err(BookingError::Conflict(format!(
            "Schedule {} is booked; cancel the booking first",
            schedule_id
        )));
    }
    if tx.schedule_has_history(schedule_id).await? {
        return Err(BookingError::Conflict(format!(
            "Schedule {} has class history",
            schedule_id
        )));
    }

    tx.delete_schedule(schedule_id).await?;
    tx.commit().await?;

    info!("Availability deleted: id={}", schedule_id);
    Ok(())
}

/// Removes every slot the acting teacher has on `day`. Either all of them go
/// or, if any is booked or has class history, none does.
pub async fn delete_availability_for_day(
    store: &dyn Store,
    actor: &Identity,
    day: &str,
) -> BookingResult<DeletedDayResponse> {
    actor.require(&[Role::Teacher])?;
    let day: DayOfWeek = day.parse()?;

    let mut tx = store.begin().await?;
    tx.lock_user(actor.user_id).await?;

    let ids: Vec<Uuid> = tx
        .schedules_for_teacher(actor.user_id)
        .await?
        .into_iter()
        .filter(|s| s.day_of_week == day)
        .map(|s| s.id)
        .collect();

    for id in &ids {
        let locked = tx.schedule_for_update(*id).await?;
        if locked.is_some_and(|s| s.is_booked) {
            warn!("Day delete rejected, slot booked: teacher_id={}, schedule_id={}", actor.user_id, id);
            return Err(BookingError::Conflict(format!(
                "Schedule {} on {} is booked; cancel the booking first",
                id, day
            )));
        }
        if tx.schedule_has_history(*id).await? {
            return Err(BookingError::Conflict(format!(
                "Schedule {} on {} has class history",
                id, day
            )));
        }
    }

    for id in &ids {
        tx.delete_schedule(*id).await?;
    }
    tx.commit().await?;

    info!(
        "Availability cleared: teacher_id={}, day={}, deleted={}",
        actor.user_id,
        day,
        ids.len()
    );
    Ok(DeletedDayResponse {
        day_of_week: day,
        deleted: ids.len(),
    })
}

pub async fn list_teacher_schedules(
    store: &dyn Store,
    teacher_id: Uuid,
) -> BookingResult<Vec<TeacherSchedule>> {
    let mut tx = store.begin().await?;
    tx.schedules_for_teacher(teacher_id).await
}

/// Free slots of every teacher teaching at least one of `instrument_ids`,
/// restricted to `days`.
pub async fn list_free_slots_for_instruments(
    store: &dyn Store,
    instrument_ids: &[Uuid],
    days: DayRange,
) -> BookingResult<impl Iterator<Item = TeacherSchedule>> {
    let slots = if instrument_ids.is_empty() {
        Vec::new()
    } else {
        let mut tx = store.begin().await?;
        tx.free_schedules_for_instruments(instrument_ids).await?
    };

    debug!(
        "Free slots for {} instruments: {} candidates",
        instrument_ids.len(),
        slots.len()
    );
    Ok(slots
        .into_iter()
        .filter(move |slot| days.contains(slot.day_of_week)))
}

/// Free slots a student could book right now with their active packages: the
/// teacher teaches a package's instrument and the slot lasts exactly as long
/// as that package's lessons.
pub async fn list_bookable_slots(
    store: &dyn Store,
    policy: &LedgerPolicy,
    student_id: Uuid,
    days: DayRange,
) -> BookingResult<Vec<AvailableSlot>> {
    let now = Utc::now();
    let mut tx = store.begin().await?;

    let mut covered: Vec<(Uuid, i32)> = Vec::new();
    for entry in tx.student_packages(student_id).await? {
        if !entry.is_active(now) {
            continue;
        }
        if let Some(package) = tx.package(entry.package_id).await? {
            let key = (package.instrument_id, package.duration_minutes);
            if !covered.contains(&key) {
                covered.push(key);
            }
        }
    }
    if covered.is_empty() {
        debug!("Student {} has no active packages", student_id);
        return Ok(Vec::new());
    }

    let mut instrument_ids: Vec<Uuid> = covered.iter().map(|(id, _)| *id).collect();
    instrument_ids.sort();
    instrument_ids.dedup();
    let slots = tx.free_schedules_for_instruments(&instrument_ids).await?;

    let mut taught: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    let mut bookable = Vec::new();
    for schedule in slots {
        if !days.contains(schedule.day_of_week) {
            continue;
        }
        if !taught.contains_key(&schedule.teacher_id) {
            let ids = tx.teacher_instruments(schedule.teacher_id).await?;
            taught.insert(schedule.teacher_id, ids);
        }
        let minutes = schedule.duration_minutes();
        let fits = taught.get(&schedule.teacher_id).is_some_and(|ids| {
            covered
                .iter()
                .any(|(instrument_id, duration)| *duration == minutes && ids.contains(instrument_id))
        });
        if fits {
            bookable.push(AvailableSlot {
                next_class_date: policy.next_class_date(schedule.day_of_week, schedule.start_time, now),
                schedule,
            });
        }
    }
    Ok(bookable)
}

/// Marks a locked slot as taken by a booking.
pub(crate) async fn reserve(tx: &mut dyn StoreTx, schedule: &TeacherSchedule) -> BookingResult<()> {
    if schedule.is_booked {
        return Err(BookingError::Conflict(format!(
            "Schedule {} is already booked",
            schedule.id
        )));
    }
    tx.set_schedule_booked(schedule.id, true).await
}

pub(crate) async fn release(tx: &mut dyn StoreTx, schedule_id: Uuid) -> BookingResult<()> {
    tx.set_schedule_booked(schedule_id, false).await
}
