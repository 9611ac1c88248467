//! Class history archive. Entries are written once, when a lesson is
//! finished, and only ever gain documentation afterwards.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    models::{
        booking::Booking,
        catalog::Package,
        history::{ClassDocumentation, ClassHistory},
        identity::{Identity, Role},
        schedule::TeacherSchedule,
    },
    store::{Store, StoreTx},
};

/// Accepts absolute `http`/`https` URLs only.
pub fn validate_documentation_url(raw: &str) -> BookingResult<String> {
    let url = Url::parse(raw.trim())
        .map_err(|e| BookingError::Validation(format!("Invalid documentation URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        scheme => Err(BookingError::Validation(format!(
            "Documentation URL must use http or https, got '{}'",
            scheme
        ))),
    }
}

fn documentation(class_history_id: Uuid, url: String, created_at: DateTime<Utc>) -> ClassDocumentation {
    ClassDocumentation {
        id: Uuid::new_v4(),
        class_history_id,
        url,
        created_at,
    }
}

/// Archives a booking that has just been completed. Fails with `Duplicate`
/// if the booking already has a history.
pub(crate) async fn record_completion(
    tx: &mut dyn StoreTx,
    booking: &Booking,
    schedule: &TeacherSchedule,
    package: &Package,
    notes: Option<String>,
    documentation_urls: Vec<String>,
    now: DateTime<Utc>,
) -> BookingResult<ClassHistory> {
    let id = Uuid::new_v4();
    let history = ClassHistory {
        id,
        booking_id: booking.id,
        teacher_id: schedule.teacher_id,
        student_id: booking.student_id,
        instrument_id: package.instrument_id,
        package_id: Some(package.id),
        status: booking.status,
        date: booking.class_date,
        start_time: schedule.start_time,
        end_time: schedule.end_time,
        notes,
        documentations: documentation_urls
            .into_iter()
            .map(|url| documentation(id, url, now))
            .collect(),
        created_at: now,
    };
    tx.insert_class_history(&history).await?;
    Ok(history)
}

pub async fn add_documentation(
    store: &dyn Store,
    actor: &Identity,
    history_id: Uuid,
    url: &str,
) -> BookingResult<ClassDocumentation> {
    actor.require(&[Role::Teacher])?;
    let url = validate_documentation_url(url)?;

    let mut tx = store.begin().await?;
    tx.class_history_for_update(history_id)
        .await?
        .filter(|h| h.teacher_id == actor.user_id)
        .ok_or_else(|| {
            BookingError::NotFound(format!("Class history with ID {} not found", history_id))
        })?;

    let documentation = documentation(history_id, url, Utc::now());
    tx.insert_documentation(&documentation).await?;
    tx.commit().await?;

    info!(
        "Documentation added: history_id={}, url={}",
        history_id, documentation.url
    );
    Ok(documentation)
}

pub async fn student_history(store: &dyn Store, student_id: Uuid) -> BookingResult<Vec<ClassHistory>> {
    let mut tx = store.begin().await?;
    tx.histories_for_student(student_id).await
}

pub async fn teacher_history(store: &dyn Store, teacher_id: Uuid) -> BookingResult<Vec<ClassHistory>> {
    let mut tx = store.begin().await?;
    tx.histories_for_teacher(teacher_id).await
}

/// The whole archive, for staff.
pub async fn all_histories(store: &dyn Store, actor: &Identity) -> BookingResult<Vec<ClassHistory>> {
    actor.require(&[Role::Admin, Role::Manager])?;
    let mut tx = store.begin().await?;
    let histories = tx.list_histories().await?;
    debug!("Listed {} class histories", histories.len());
    Ok(histories)
}
