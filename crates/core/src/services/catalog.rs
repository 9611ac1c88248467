//! Catalog store: instruments, packages and which instruments each teacher
//! teaches. Mutations are admin-only; reads are open.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    models::{
        catalog::{Instrument, InstrumentRequest, LESSON_DURATIONS, Package, PackageRequest},
        identity::{Identity, Role},
    },
    store::Store,
};

fn clean_name(raw: &str, what: &str) -> BookingResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(BookingError::Validation(format!("{} name is required", what)));
    }
    Ok(name.to_string())
}

fn validate_package(request: &PackageRequest) -> BookingResult<String> {
    let name = clean_name(&request.name, "Package")?;
    if request.quota <= 0 {
        return Err(BookingError::Validation(
            "Package quota must be greater than zero".to_string(),
        ));
    }
    if !LESSON_DURATIONS.contains(&request.duration_minutes) {
        return Err(BookingError::Validation(format!(
            "Package duration must be one of {:?} minutes",
            LESSON_DURATIONS
        )));
    }
    if request.price < 0 {
        return Err(BookingError::Validation(
            "Package price must not be negative".to_string(),
        ));
    }
    Ok(name)
}

pub async fn create_instrument(
    store: &dyn Store,
    actor: &Identity,
    request: &InstrumentRequest,
) -> BookingResult<Instrument> {
    actor.require(&[Role::Admin])?;
    let name = clean_name(&request.name, "Instrument")?;

    let mut tx = store.begin().await?;
    if tx.instrument_by_name(&name).await?.is_some() {
        return Err(BookingError::Conflict(format!(
            "Instrument '{}' already exists",
            name
        )));
    }

    let instrument = Instrument {
        id: Uuid::new_v4(),
        name,
        created_at: Utc::now(),
    };
    tx.insert_instrument(&instrument).await?;
    tx.commit().await?;

    info!("Instrument created: id={}, name={}", instrument.id, instrument.name);
    Ok(instrument)
}

pub async fn rename_instrument(
    store: &dyn Store,
    actor: &Identity,
    id: Uuid,
    request: &InstrumentRequest,
) -> BookingResult<Instrument> {
    actor.require(&[Role::Admin])?;
    let name = clean_name(&request.name, "Instrument")?;

    let mut tx = store.begin().await?;
    let mut instrument = tx
        .instrument(id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Instrument with ID {} not found", id)))?;

    if let Some(other) = tx.instrument_by_name(&name).await? {
        if other.id != id {
            return Err(BookingError::Conflict(format!(
                "Instrument '{}' already exists",
                name
            )));
        }
    }

    instrument.name = name;
    tx.update_instrument(&instrument).await?;
    tx.commit().await?;

    Ok(instrument)
}

/// Rejected while a package or a teacher still references the instrument.
pub async fn delete_instrument(store: &dyn Store, actor: &Identity, id: Uuid) -> BookingResult<()> {
    actor.require(&[Role::Admin])?;

    let mut tx = store.begin().await?;
    if tx.instrument(id).await?.is_none() {
        return Err(BookingError::NotFound(format!(
            "Instrument with ID {} not found",
            id
        )));
    }
    if tx.instrument_in_use(id).await? {
        return Err(BookingError::Conflict(format!(
            "Instrument {} is still referenced by a package or teacher",
            id
        )));
    }

    tx.delete_instrument(id).await?;
    tx.commit().await?;

    info!("Instrument deleted: id={}", id);
    Ok(())
}

pub async fn list_instruments(store: &dyn Store) -> BookingResult<Vec<Instrument>> {
    let mut tx = store.begin().await?;
    let instruments = tx.list_instruments().await?;
    debug!("Listed {} instruments", instruments.len());
    Ok(instruments)
}

pub async fn create_package(
    store: &dyn Store,
    actor: &Identity,
    request: &PackageRequest,
) -> BookingResult<Package> {
    actor.require(&[Role::Admin])?;
    let name = validate_package(request)?;

    let mut tx = store.begin().await?;
    if tx.instrument(request.instrument_id).await?.is_none() {
        return Err(BookingError::NotFound(format!(
            "Instrument with ID {} not found",
            request.instrument_id
        )));
    }
    if tx.package_by_name(&name).await?.is_some() {
        return Err(BookingError::Conflict(format!(
            "Package '{}' already exists",
            name
        )));
    }

    let package = Package {
        id: Uuid::new_v4(),
        name,
        quota: request.quota,
        instrument_id: request.instrument_id,
        duration_minutes: request.duration_minutes,
        description: request.description.trim().to_string(),
        price: request.price,
        created_at: Utc::now(),
    };
    tx.insert_package(&package).await?;
    tx.commit().await?;

    info!(
        "Package created: id={}, name={}, quota={}",
        package.id, package.name, package.quota
    );
    Ok(package)
}

/// Updates the template only; quotas already issued to students keep their
/// values. Once issued, a package can no longer change what it pays for.
pub async fn update_package(
    store: &dyn Store,
    actor: &Identity,
    id: Uuid,
    request: &PackageRequest,
) -> BookingResult<Package> {
    actor.require(&[Role::Admin])?;
    let name = validate_package(request)?;

    let mut tx = store.begin().await?;
    let mut package = tx
        .package(id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Package with ID {} not found", id)))?;

    if tx.instrument(request.instrument_id).await?.is_none() {
        return Err(BookingError::NotFound(format!(
            "Instrument with ID {} not found",
            request.instrument_id
        )));
    }
    if let Some(other) = tx.package_by_name(&name).await? {
        if other.id != id {
            return Err(BookingError::Conflict(format!(
                "Package '{}' already exists",
                name
            )));
        }
    }

    let retargeted = package.instrument_id != request.instrument_id
        || package.duration_minutes != request.duration_minutes;
    if retargeted && tx.package_in_use(id).await? {
        warn!("Package edit rejected, already issued: id={}", id);
        return Err(BookingError::Conflict(format!(
            "Package {} has been issued to students; its instrument and duration are fixed",
            id
        )));
    }

    package.name = name;
    package.quota = request.quota;
    package.instrument_id = request.instrument_id;
    package.duration_minutes = request.duration_minutes;
    package.description = request.description.trim().to_string();
    package.price = request.price;
    tx.update_package(&package).await?;
    tx.commit().await?;

    Ok(package)
}

pub async fn delete_package(store: &dyn Store, actor: &Identity, id: Uuid) -> BookingResult<()> {
    actor.require(&[Role::Admin])?;

    let mut tx = store.begin().await?;
    if tx.package(id).await?.is_none() {
        return Err(BookingError::NotFound(format!("Package with ID {} not found", id)));
    }
    if tx.package_in_use(id).await? {
        return Err(BookingError::Conflict(format!(
            "Package {} has been issued to students",
            id
        )));
    }

    tx.delete_package(id).await?;
    tx.commit().await?;

    info!("Package deleted: id={}", id);
    Ok(())
}

pub async fn list_packages(store: &dyn Store) -> BookingResult<Vec<Package>> {
    let mut tx = store.begin().await?;
    tx.list_packages().await
}

/// Replaces the set of instruments a teacher teaches.
pub async fn set_teacher_instruments(
    store: &dyn Store,
    actor: &Identity,
    teacher_id: Uuid,
    instrument_ids: &[Uuid],
) -> BookingResult<Vec<Uuid>> {
    actor.require(&[Role::Admin])?;

    let mut tx = store.begin().await?;
    for id in instrument_ids {
        if tx.instrument(*id).await?.is_none() {
            return Err(BookingError::NotFound(format!(
                "Instrument with ID {} not found",
                id
            )));
        }
    }

    tx.set_teacher_instruments(teacher_id, instrument_ids).await?;
    let assigned = tx.teacher_instruments(teacher_id).await?;
    tx.commit().await?;

    info!(
        "Teacher instruments set: teacher_id={}, count={}",
        teacher_id,
        assigned.len()
    );
    Ok(assigned)
}

pub async fn teacher_instruments(store: &dyn Store, teacher_id: Uuid) -> BookingResult<Vec<Uuid>> {
    let mut tx = store.begin().await?;
    tx.teacher_instruments(teacher_id).await
}
