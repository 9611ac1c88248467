//! Quota ledger: packages issued to students and their remaining lessons.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    models::{
        catalog::Package,
        identity::{Identity, Role},
        quota::{StudentPackage, StudentPackageResponse},
    },
    policy::LedgerPolicy,
    store::{Store, StoreTx},
};

async fn require_package(tx: &mut dyn StoreTx, package_id: Uuid) -> BookingResult<Package> {
    tx.package(package_id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Package with ID {} not found", package_id)))
}

/// Picks the entry a lesson is charged to from entries that already match
/// the requested package or instrument, ordered soonest `end_date` first.
pub(crate) fn pick_entry(
    candidates: Vec<StudentPackage>,
    now: DateTime<Utc>,
) -> BookingResult<StudentPackage> {
    let mut unexpired = candidates
        .into_iter()
        .filter(|entry| entry.is_unexpired(now))
        .peekable();

    if unexpired.peek().is_none() {
        return Err(BookingError::NotSubscribed(
            "No unexpired package covers this lesson".to_string(),
        ));
    }
    unexpired
        .find(|entry| entry.remaining_quota > 0)
        .ok_or_else(|| {
            BookingError::QuotaExhausted("All matching packages have no lessons left".to_string())
        })
}

/// Charges one lesson to a locked entry.
pub(crate) async fn consume_entry(
    tx: &mut dyn StoreTx,
    entry: &StudentPackage,
) -> BookingResult<StudentPackage> {
    if entry.remaining_quota <= 0 {
        return Err(BookingError::QuotaExhausted(format!(
            "Student package {} has no lessons left",
            entry.id
        )));
    }
    let mut updated = entry.clone();
    updated.remaining_quota -= 1;
    tx.set_remaining_quota(updated.id, updated.remaining_quota)
        .await?;
    Ok(updated)
}

/// Gives one lesson back to an entry, never above the quota it was issued with.
pub(crate) async fn restore_entry(
    tx: &mut dyn StoreTx,
    entry_id: Uuid,
) -> BookingResult<StudentPackage> {
    let mut entry = tx
        .student_package_for_update(entry_id)
        .await?
        .ok_or_else(|| {
            BookingError::Storage(eyre::eyre!("Student package {} does not exist", entry_id))
        })?;

    let restored = entry.adjusted_quota(1);
    if restored != entry.remaining_quota {
        tx.set_remaining_quota(entry.id, restored).await?;
        entry.remaining_quota = restored;
    } else {
        debug!("Student package {} already at its ceiling", entry.id);
    }
    Ok(entry)
}

async fn entries_of_package(
    tx: &mut dyn StoreTx,
    student_id: Uuid,
    package_id: Uuid,
) -> BookingResult<Vec<StudentPackage>> {
    tx.lock_user(student_id).await?;
    Ok(tx
        .student_packages_for_update(student_id)
        .await?
        .into_iter()
        .filter(|entry| entry.package_id == package_id)
        .collect())
}

pub async fn assign_package(
    store: &dyn Store,
    policy: &LedgerPolicy,
    actor: &Identity,
    student_id: Uuid,
    package_id: Uuid,
) -> BookingResult<StudentPackage> {
    actor.require(&[Role::Admin, Role::Manager])?;
    let now = Utc::now();

    let mut tx = store.begin().await?;
    let package = require_package(tx.as_mut(), package_id).await?;

    let existing = entries_of_package(tx.as_mut(), student_id, package_id).await?;
    if existing.iter().any(|entry| entry.is_active(now)) {
        return Err(BookingError::Conflict(format!(
            "Student {} already holds an active '{}' package",
            student_id, package.name
        )));
    }

    let entry = StudentPackage {
        id: Uuid::new_v4(),
        student_id,
        package_id,
        quota: package.quota,
        remaining_quota: package.quota,
        start_date: now,
        end_date: policy.validity_end(now)?,
    };
    tx.insert_student_package(&entry).await?;
    tx.commit().await?;

    info!(
        "Package assigned: student_id={}, package_id={}, quota={}, until={}",
        student_id, package_id, entry.remaining_quota, entry.end_date
    );
    Ok(entry)
}

/// Charges one lesson to the student's soonest-expiring unexpired entry of
/// `package_id` that still has lessons left.
pub async fn consume(
    store: &dyn Store,
    student_id: Uuid,
    package_id: Uuid,
) -> BookingResult<StudentPackage> {
    let now = Utc::now();
    let mut tx = store.begin().await?;

    let candidates = entries_of_package(tx.as_mut(), student_id, package_id).await?;
    let entry = pick_entry(candidates, now)?;
    let updated = consume_entry(tx.as_mut(), &entry).await?;
    tx.commit().await?;

    debug!(
        "Quota consumed: entry_id={}, remaining={}",
        updated.id, updated.remaining_quota
    );
    Ok(updated)
}

/// Gives one lesson back to an unexpired entry of `package_id`, preferring
/// one below its ceiling.
pub async fn restore(
    store: &dyn Store,
    student_id: Uuid,
    package_id: Uuid,
) -> BookingResult<StudentPackage> {
    let now = Utc::now();
    let mut tx = store.begin().await?;
    let package = require_package(tx.as_mut(), package_id).await?;

    let unexpired: Vec<_> = entries_of_package(tx.as_mut(), student_id, package_id)
        .await?
        .into_iter()
        .filter(|entry| entry.is_unexpired(now))
        .collect();
    let target = unexpired
        .iter()
        .find(|entry| entry.remaining_quota < entry.quota)
        .or_else(|| unexpired.first())
        .ok_or_else(|| {
            BookingError::NotSubscribed(format!(
                "Student {} holds no unexpired '{}' package",
                student_id, package.name
            ))
        })?;

    let restored = restore_entry(tx.as_mut(), target.id).await?;
    tx.commit().await?;

    debug!(
        "Quota restored: entry_id={}, remaining={}",
        restored.id, restored.remaining_quota
    );
    Ok(restored)
}

/// Manual correction by staff. The result is clamped to `[0, quota]` of the
/// entry.
pub async fn modify_quota(
    store: &dyn Store,
    actor: &Identity,
    student_id: Uuid,
    package_id: Uuid,
    delta: i32,
) -> BookingResult<StudentPackage> {
    actor.require(&[Role::Manager, Role::Admin])?;
    let now = Utc::now();

    let mut tx = store.begin().await?;
    let package = require_package(tx.as_mut(), package_id).await?;

    let mut entry = entries_of_package(tx.as_mut(), student_id, package_id)
        .await?
        .into_iter()
        .find(|entry| entry.is_unexpired(now))
        .ok_or_else(|| {
            BookingError::NotSubscribed(format!(
                "Student {} holds no unexpired '{}' package",
                student_id, package.name
            ))
        })?;

    if delta == 0 {
        return Ok(entry);
    }

    let adjusted = entry.adjusted_quota(delta);
    if adjusted != entry.remaining_quota.saturating_add(delta) {
        warn!(
            "Quota change clamped: entry_id={}, requested={}, result={}",
            entry.id, delta, adjusted
        );
    }
    tx.set_remaining_quota(entry.id, adjusted).await?;
    tx.commit().await?;

    info!(
        "Quota modified by {}: entry_id={}, {} -> {}",
        actor.user_id, entry.id, entry.remaining_quota, adjusted
    );
    entry.remaining_quota = adjusted;
    Ok(entry)
}

pub async fn student_packages(
    store: &dyn Store,
    student_id: Uuid,
) -> BookingResult<Vec<StudentPackageResponse>> {
    let now = Utc::now();
    let mut tx = store.begin().await?;

    let mut packages = Vec::new();
    for entry in tx.student_packages(student_id).await? {
        let package = require_package(tx.as_mut(), entry.package_id).await?;
        packages.push(StudentPackageResponse {
            is_active: entry.is_active(now),
            package_name: package.name,
            instrument_id: package.instrument_id,
            duration_minutes: package.duration_minutes,
            entry,
        });
    }
    Ok(packages)
}
