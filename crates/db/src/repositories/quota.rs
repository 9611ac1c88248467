use crate::models::DbStudentPackage;
use eyre::Result;
use lessonbook_core::models::quota::StudentPackage;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn get_student_packages(
    conn: &mut PgConnection,
    student_id: Uuid,
) -> Result<Vec<DbStudentPackage>> {
    let entries = sqlx::query_as::<_, DbStudentPackage>(
        r#"
        SELECT id, student_id, package_id, quota, remaining_quota, start_date, end_date
        FROM student_packages
        WHERE student_id = $1
        ORDER BY end_date ASC, id ASC
        "#,
    )
    .bind(student_id)
    .fetch_all(conn)
    .await?;

    Ok(entries)
}

pub async fn lock_student_packages(
    conn: &mut PgConnection,
    student_id: Uuid,
) -> Result<Vec<DbStudentPackage>> {
    let entries = sqlx::query_as::<_, DbStudentPackage>(
        r#"
        SELECT id, student_id, package_id, quota, remaining_quota, start_date, end_date
        FROM student_packages
        WHERE student_id = $1
        ORDER BY end_date ASC, id ASC
        FOR UPDATE
        "#,
    )
    .bind(student_id)
    .fetch_all(conn)
    .await?;

    Ok(entries)
}

pub async fn lock_student_package(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbStudentPackage>> {
    let entry = sqlx::query_as::<_, DbStudentPackage>(
        r#"
        SELECT id, student_id, package_id, quota, remaining_quota, start_date, end_date
        FROM student_packages
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(entry)
}

pub async fn insert_student_package(conn: &mut PgConnection, entry: &StudentPackage) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO student_packages (id, student_id, package_id, quota, remaining_quota, start_date, end_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.id)
    .bind(entry.student_id)
    .bind(entry.package_id)
    .bind(entry.quota)
    .bind(entry.remaining_quota)
    .bind(entry.start_date)
    .bind(entry.end_date)
    .execute(conn)
    .await?;

    Ok(())
}

/// Returns false if the entry does not exist.
pub async fn set_remaining_quota(conn: &mut PgConnection, id: Uuid, remaining_quota: i32) -> Result<bool> {
    let result = sqlx::query("UPDATE student_packages SET remaining_quota = $2 WHERE id = $1")
        .bind(id)
        .bind(remaining_quota)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}
