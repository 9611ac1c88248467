use crate::models::DbTeacherSchedule;
use eyre::Result;
use lessonbook_core::models::schedule::TeacherSchedule;
use sqlx::PgConnection;
use uuid::Uuid;

/// Sort key putting the stored day names in Monday-first order.
fn day_order(column: &str) -> String {
    format!(
        "array_position(ARRAY['senin','selasa','rabu','kamis','jumat','sabtu','minggu']::varchar[], {})",
        column
    )
}

pub async fn get_schedule(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbTeacherSchedule>> {
    let schedule = sqlx::query_as::<_, DbTeacherSchedule>(
        r#"
        SELECT id, teacher_id, day_of_week, start_time, end_time, is_booked, created_at
        FROM teacher_schedules
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(schedule)
}

pub async fn lock_schedule(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbTeacherSchedule>> {
    let schedule = sqlx::query_as::<_, DbTeacherSchedule>(
        r#"
        SELECT id, teacher_id, day_of_week, start_time, end_time, is_booked, created_at
        FROM teacher_schedules
        WHERE id = $1 AND deleted_at IS NULL
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(schedule)
}

pub async fn get_schedules_by_teacher(
    conn: &mut PgConnection,
    teacher_id: Uuid,
) -> Result<Vec<DbTeacherSchedule>> {
    let query = format!(
        r#"
        SELECT id, teacher_id, day_of_week, start_time, end_time, is_booked, created_at
        FROM teacher_schedules
        WHERE teacher_id = $1 AND deleted_at IS NULL
        ORDER BY {}, start_time ASC, id ASC
        "#,
        day_order("day_of_week")
    );
    let schedules = sqlx::query_as::<_, DbTeacherSchedule>(&query)
        .bind(teacher_id)
        .fetch_all(conn)
        .await?;

    Ok(schedules)
}

pub async fn get_free_schedules_for_instruments(
    conn: &mut PgConnection,
    instrument_ids: &[Uuid],
) -> Result<Vec<DbTeacherSchedule>> {
    let query = format!(
        r#"
        SELECT s.id, s.teacher_id, s.day_of_week, s.start_time, s.end_time, s.is_booked, s.created_at
        FROM teacher_schedules s
        WHERE s.is_booked = FALSE
          AND s.deleted_at IS NULL
          AND EXISTS (
              SELECT 1 FROM teacher_instruments ti
              WHERE ti.teacher_id = s.teacher_id AND ti.instrument_id = ANY($1)
          )
        ORDER BY {}, s.start_time ASC, s.id ASC
        "#,
        day_order("s.day_of_week")
    );
    let schedules = sqlx::query_as::<_, DbTeacherSchedule>(&query)
        .bind(instrument_ids)
        .fetch_all(conn)
        .await?;

    Ok(schedules)
}

pub async fn insert_schedule(conn: &mut PgConnection, schedule: &TeacherSchedule) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO teacher_schedules (id, teacher_id, day_of_week, start_time, end_time, is_booked, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(schedule.id)
    .bind(schedule.teacher_id)
    .bind(schedule.day_of_week.as_str())
    .bind(schedule.start_time)
    .bind(schedule.end_time)
    .bind(schedule.is_booked)
    .bind(schedule.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Returns false if no live slot with that id exists.
pub async fn set_schedule_booked(conn: &mut PgConnection, id: Uuid, is_booked: bool) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE teacher_schedules SET is_booked = $2 WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(is_booked)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn retire_schedule(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE teacher_schedules SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn schedule_has_history(conn: &mut PgConnection, id: Uuid) -> Result<bool> {
    let has_history = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM class_histories h
            JOIN bookings b ON b.id = h.booking_id
            WHERE b.schedule_id = $1
        )
        "#,
    )
    .bind(id)
    .fetch_one(conn)
    .await?;

    Ok(has_history)
}
