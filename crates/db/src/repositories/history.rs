use crate::models::{DbClassDocumentation, DbClassHistory};
use eyre::Result;
use lessonbook_core::models::history::{ClassDocumentation, ClassHistory};
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn insert_class_history(conn: &mut PgConnection, history: &ClassHistory) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO class_histories (id, booking_id, teacher_id, student_id, instrument_id, package_id,
                                     status, date, start_time, end_time, notes, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(history.id)
    .bind(history.booking_id)
    .bind(history.teacher_id)
    .bind(history.student_id)
    .bind(history.instrument_id)
    .bind(history.package_id)
    .bind(history.status.as_str())
    .bind(history.date)
    .bind(history.start_time)
    .bind(history.end_time)
    .bind(&history.notes)
    .bind(history.created_at)
    .execute(&mut *conn)
    .await?;

    for documentation in &history.documentations {
        insert_documentation(&mut *conn, documentation).await?;
    }

    Ok(())
}

pub async fn insert_documentation(
    conn: &mut PgConnection,
    documentation: &ClassDocumentation,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO class_documentations (id, class_history_id, url, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(documentation.id)
    .bind(documentation.class_history_id)
    .bind(&documentation.url)
    .bind(documentation.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn lock_class_history(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbClassHistory>> {
    let history = sqlx::query_as::<_, DbClassHistory>(
        r#"
        SELECT id, booking_id, teacher_id, student_id, instrument_id, package_id,
               status, date, start_time, end_time, notes, created_at
        FROM class_histories
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(history)
}

pub async fn get_class_history_by_booking(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> Result<Option<DbClassHistory>> {
    let history = sqlx::query_as::<_, DbClassHistory>(
        r#"
        SELECT id, booking_id, teacher_id, student_id, instrument_id, package_id,
               status, date, start_time, end_time, notes, created_at
        FROM class_histories
        WHERE booking_id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(conn)
    .await?;

    Ok(history)
}

pub async fn get_histories_by_student(
    conn: &mut PgConnection,
    student_id: Uuid,
) -> Result<Vec<DbClassHistory>> {
    let histories = sqlx::query_as::<_, DbClassHistory>(
        r#"
        SELECT id, booking_id, teacher_id, student_id, instrument_id, package_id,
               status, date, start_time, end_time, notes, created_at
        FROM class_histories
        WHERE student_id = $1
        ORDER BY date DESC, start_time DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(conn)
    .await?;

    Ok(histories)
}

pub async fn get_histories_by_teacher(
    conn: &mut PgConnection,
    teacher_id: Uuid,
) -> Result<Vec<DbClassHistory>> {
    let histories = sqlx::query_as::<_, DbClassHistory>(
        r#"
        SELECT id, booking_id, teacher_id, student_id, instrument_id, package_id,
               status, date, start_time, end_time, notes, created_at
        FROM class_histories
        WHERE teacher_id = $1
        ORDER BY date DESC, start_time DESC
        "#,
    )
    .bind(teacher_id)
    .fetch_all(conn)
    .await?;

    Ok(histories)
}

pub async fn get_all_histories(conn: &mut PgConnection) -> Result<Vec<DbClassHistory>> {
    let histories = sqlx::query_as::<_, DbClassHistory>(
        r#"
        SELECT id, booking_id, teacher_id, student_id, instrument_id, package_id,
               status, date, start_time, end_time, notes, created_at
        FROM class_histories
        ORDER BY date DESC, start_time DESC
        "#,
    )
    .fetch_all(conn)
    .await?;

    Ok(histories)
}

/// Attachments of the given histories, oldest first.
pub async fn get_documentations(
    conn: &mut PgConnection,
    history_ids: &[Uuid],
) -> Result<Vec<DbClassDocumentation>> {
    let documentations = sqlx::query_as::<_, DbClassDocumentation>(
        r#"
        SELECT id, class_history_id, url, created_at
        FROM class_documentations
        WHERE class_history_id = ANY($1)
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(history_ids)
    .fetch_all(conn)
    .await?;

    Ok(documentations)
}
