use crate::models::DbBooking;
use eyre::Result;
use lessonbook_core::models::booking::Booking;
use sqlx::PgConnection;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

pub async fn lock_booking(conn: &mut PgConnection, id: Uuid) -> Result<Option<DbBooking>> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, student_id, schedule_id, student_package_id, class_date, status,
               booked_at, completed_at, cancelled_at, rescheduled_at, cancelled_by, notes
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(booking)
}

pub async fn get_bookings_by_student(conn: &mut PgConnection, student_id: Uuid) -> Result<Vec<DbBooking>> {
    let bookings = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, student_id, schedule_id, student_package_id, class_date, status,
               booked_at, completed_at, cancelled_at, rescheduled_at, cancelled_by, notes
        FROM bookings
        WHERE student_id = $1
        ORDER BY booked_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(conn)
    .await?;

    Ok(bookings)
}

pub async fn get_bookings_by_teacher(conn: &mut PgConnection, teacher_id: Uuid) -> Result<Vec<DbBooking>> {
    let bookings = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT b.id, b.student_id, b.schedule_id, b.student_package_id, b.class_date, b.status,
               b.booked_at, b.completed_at, b.cancelled_at, b.rescheduled_at, b.cancelled_by, b.notes
        FROM bookings b
        JOIN teacher_schedules s ON s.id = b.schedule_id
        WHERE s.teacher_id = $1
        ORDER BY b.booked_at DESC
        "#,
    )
    .bind(teacher_id)
    .fetch_all(conn)
    .await?;

    Ok(bookings)
}

/// Instrument names of the lessons booked to start at one time of one day,
/// across all teachers.
pub async fn get_booked_instrument_names_at(
    conn: &mut PgConnection,
    class_date: NaiveDate,
    start_time: NaiveTime,
) -> Result<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        r#"
        SELECT i.name
        FROM bookings b
        JOIN teacher_schedules s ON s.id = b.schedule_id
        JOIN student_packages sp ON sp.id = b.student_package_id
        JOIN packages p ON p.id = sp.package_id
        JOIN instruments i ON i.id = p.instrument_id
        WHERE b.status = 'booked' AND b.class_date = $1 AND s.start_time = $2
        "#,
    )
    .bind(class_date)
    .bind(start_time)
    .fetch_all(conn)
    .await?;

    Ok(names)
}

pub async fn insert_booking(conn: &mut PgConnection, booking: &Booking) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO bookings (id, student_id, schedule_id, student_package_id, class_date, status,
                              booked_at, completed_at, cancelled_at, rescheduled_at, cancelled_by, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(booking.id)
    .bind(booking.student_id)
    .bind(booking.schedule_id)
    .bind(booking.student_package_id)
    .bind(booking.class_date)
    .bind(booking.status.as_str())
    .bind(booking.booked_at)
    .bind(booking.completed_at)
    .bind(booking.cancelled_at)
    .bind(booking.rescheduled_at)
    .bind(booking.cancelled_by)
    .bind(&booking.notes)
    .execute(conn)
    .await?;

    Ok(())
}

/// Writes the mutable columns back. Returns false if the booking does not exist.
pub async fn update_booking(conn: &mut PgConnection, booking: &Booking) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = $2, completed_at = $3, cancelled_at = $4, rescheduled_at = $5,
            cancelled_by = $6, notes = $7
        WHERE id = $1
        "#,
    )
    .bind(booking.id)
    .bind(booking.status.as_str())
    .bind(booking.completed_at)
    .bind(booking.cancelled_at)
    .bind(booking.rescheduled_at)
    .bind(booking.cancelled_by)
    .bind(&booking.notes)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
