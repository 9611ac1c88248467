use crate::models::{DbInstrument, DbPackage};
use eyre::Result;
use lessonbook_core::models::catalog::{Instrument, Package};
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn get_instrument(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbInstrument>> {
    let instrument = sqlx::query_as::<_, DbInstrument>(
        r#"
        SELECT id, name, created_at
        FROM instruments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(instrument)
}

pub async fn get_instrument_by_name(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<DbInstrument>> {
    let instrument = sqlx::query_as::<_, DbInstrument>(
        r#"
        SELECT id, name, created_at
        FROM instruments
        WHERE LOWER(name) = LOWER($1)
        "#,
    )
    .bind(name)
    .fetch_optional(conn)
    .await?;

    Ok(instrument)
}

pub async fn list_instruments(conn: &mut PgConnection) -> Result<Vec<DbInstrument>> {
    let instruments = sqlx::query_as::<_, DbInstrument>(
        r#"
        SELECT id, name, created_at
        FROM instruments
        ORDER BY name ASC
        "#,
    )
    .fetch_all(conn)
    .await?;

    Ok(instruments)
}

pub async fn insert_instrument(conn: &mut PgConnection, instrument: &Instrument) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO instruments (id, name, created_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(instrument.id)
    .bind(&instrument.name)
    .bind(instrument.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn update_instrument(conn: &mut PgConnection, instrument: &Instrument) -> Result<()> {
    sqlx::query("UPDATE instruments SET name = $2 WHERE id = $1")
        .bind(instrument.id)
        .bind(&instrument.name)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn delete_instrument(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM instruments WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn instrument_in_use(conn: &mut PgConnection, id: Uuid) -> Result<bool> {
    let in_use = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (SELECT 1 FROM packages WHERE instrument_id = $1)
            OR EXISTS (SELECT 1 FROM teacher_instruments WHERE instrument_id = $1)
        "#,
    )
    .bind(id)
    .fetch_one(conn)
    .await?;

    Ok(in_use)
}

pub async fn get_package(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbPackage>> {
    let package = sqlx::query_as::<_, DbPackage>(
        r#"
        SELECT id, name, quota, instrument_id, duration_minutes, description, price, created_at
        FROM packages
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(package)
}

pub async fn get_package_by_name(conn: &mut PgConnection, name: &str) -> Result<Option<DbPackage>> {
    let package = sqlx::query_as::<_, DbPackage>(
        r#"
        SELECT id, name, quota, instrument_id, duration_minutes, description, price, created_at
        FROM packages
        WHERE LOWER(name) = LOWER($1)
        "#,
    )
    .bind(name)
    .fetch_optional(conn)
    .await?;

    Ok(package)
}

pub async fn list_packages(conn: &mut PgConnection) -> Result<Vec<DbPackage>> {
    let packages = sqlx::query_as::<_, DbPackage>(
        r#"
        SELECT id, name, quota, instrument_id, duration_minutes, description, price, created_at
        FROM packages
        ORDER BY name ASC
        "#,
    )
    .fetch_all(conn)
    .await?;

    Ok(packages)
}

pub async fn insert_package(conn: &mut PgConnection, package: &Package) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO packages (id, name, quota, instrument_id, duration_minutes, description, price, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(package.id)
    .bind(&package.name)
    .bind(package.quota)
    .bind(package.instrument_id)
    .bind(package.duration_minutes)
    .bind(&package.description)
    .bind(package.price)
    .bind(package.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn update_package(conn: &mut PgConnection, package: &Package) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE packages
        SET name = $2, quota = $3, instrument_id = $4, duration_minutes = $5, description = $6, price = $7
        WHERE id = $1
        "#,
    )
    .bind(package.id)
    .bind(&package.name)
    .bind(package.quota)
    .bind(package.instrument_id)
    .bind(package.duration_minutes)
    .bind(&package.description)
    .bind(package.price)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn delete_package(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM packages WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn package_in_use(conn: &mut PgConnection, id: Uuid) -> Result<bool> {
    let in_use = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM student_packages WHERE package_id = $1)",
    )
    .bind(id)
    .fetch_one(conn)
    .await?;

    Ok(in_use)
}

pub async fn get_teacher_instruments(conn: &mut PgConnection, teacher_id: Uuid) -> Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT instrument_id
        FROM teacher_instruments
        WHERE teacher_id = $1
        ORDER BY instrument_id ASC
        "#,
    )
    .bind(teacher_id)
    .fetch_all(conn)
    .await?;

    Ok(ids)
}

pub async fn replace_teacher_instruments(
    conn: &mut PgConnection,
    teacher_id: Uuid,
    instrument_ids: &[Uuid],
) -> Result<()> {
    sqlx::query("DELETE FROM teacher_instruments WHERE teacher_id = $1")
        .bind(teacher_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO teacher_instruments (teacher_id, instrument_id)
        SELECT $1, UNNEST($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(teacher_id)
    .bind(instrument_ids)
    .execute(conn)
    .await?;

    Ok(())
}
