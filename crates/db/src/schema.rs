use eyre::{Result, WrapErr};
use sqlx::{Pool, Postgres};
use tracing::{debug, info};

// Statements run one at a time, in order. All are idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS instruments (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS packages (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        quota INTEGER NOT NULL,
        instrument_id UUID NOT NULL REFERENCES instruments(id),
        duration_minutes INTEGER NOT NULL DEFAULT 60,
        description TEXT NOT NULL DEFAULT '',
        price BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT positive_quota CHECK (quota > 0),
        CONSTRAINT lesson_duration CHECK (duration_minutes IN (30, 60)),
        CONSTRAINT non_negative_price CHECK (price >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teacher_instruments (
        teacher_id UUID NOT NULL,
        instrument_id UUID NOT NULL REFERENCES instruments(id),
        PRIMARY KEY (teacher_id, instrument_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teacher_schedules (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        teacher_id UUID NOT NULL,
        day_of_week VARCHAR(16) NOT NULL,
        start_time TIME NOT NULL,
        end_time TIME NOT NULL,
        is_booked BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        deleted_at TIMESTAMP WITH TIME ZONE NULL,
        CONSTRAINT valid_time_range CHECK (end_time > start_time),
        CONSTRAINT valid_day_of_week CHECK (
            day_of_week IN ('senin', 'selasa', 'rabu', 'kamis', 'jumat', 'sabtu', 'minggu')
        )
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS student_packages (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        student_id UUID NOT NULL,
        package_id UUID NOT NULL REFERENCES packages(id),
        quota INTEGER NOT NULL,
        remaining_quota INTEGER NOT NULL,
        start_date TIMESTAMP WITH TIME ZONE NOT NULL,
        end_date TIMESTAMP WITH TIME ZONE NOT NULL,
        CONSTRAINT non_negative_quota CHECK (remaining_quota >= 0),
        CONSTRAINT within_issued_quota CHECK (remaining_quota <= quota),
        CONSTRAINT valid_validity_window CHECK (end_date > start_date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        student_id UUID NOT NULL,
        schedule_id UUID NOT NULL REFERENCES teacher_schedules(id),
        student_package_id UUID NOT NULL REFERENCES student_packages(id),
        class_date DATE NOT NULL,
        status VARCHAR(16) NOT NULL,
        booked_at TIMESTAMP WITH TIME ZONE NOT NULL,
        completed_at TIMESTAMP WITH TIME ZONE NULL,
        cancelled_at TIMESTAMP WITH TIME ZONE NULL,
        rescheduled_at TIMESTAMP WITH TIME ZONE NULL,
        cancelled_by UUID NULL,
        notes TEXT NULL,
        CONSTRAINT valid_status CHECK (
            status IN ('booked', 'completed', 'cancelled', 'rescheduled')
        )
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS class_histories (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        booking_id UUID NOT NULL REFERENCES bookings(id),
        teacher_id UUID NOT NULL,
        student_id UUID NOT NULL,
        instrument_id UUID NOT NULL,
        package_id UUID NULL REFERENCES packages(id) ON DELETE SET NULL,
        status VARCHAR(16) NOT NULL,
        date DATE NOT NULL,
        start_time TIME NOT NULL,
        end_time TIME NOT NULL,
        notes TEXT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS class_documentations (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        class_history_id UUID NOT NULL REFERENCES class_histories(id) ON DELETE CASCADE,
        url TEXT NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    // Unique indexes the store maps back to domain errors
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_instruments_name ON instruments (LOWER(name))",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_packages_name ON packages (LOWER(name))",
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_active_schedule
        ON bookings (schedule_id) WHERE status = 'booked'
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_class_histories_booking_id ON class_histories (booking_id)",
    // Lookups
    "CREATE INDEX IF NOT EXISTS idx_teacher_schedules_teacher_id ON teacher_schedules (teacher_id)",
    r#"
    CREATE INDEX IF NOT EXISTS idx_teacher_schedules_free
        ON teacher_schedules (teacher_id) WHERE is_booked = FALSE AND deleted_at IS NULL
    "#,
    "CREATE INDEX IF NOT EXISTS idx_student_packages_student_id ON student_packages (student_id)",
    "CREATE INDEX IF NOT EXISTS idx_bookings_student_id ON bookings (student_id)",
    "CREATE INDEX IF NOT EXISTS idx_bookings_schedule_id ON bookings (schedule_id)",
    "CREATE INDEX IF NOT EXISTS idx_bookings_class_date ON bookings (class_date) WHERE status = 'booked'",
    "CREATE INDEX IF NOT EXISTS idx_class_histories_student_id ON class_histories (student_id)",
    "CREATE INDEX IF NOT EXISTS idx_class_histories_teacher_id ON class_histories (teacher_id)",
    r#"
    CREATE INDEX IF NOT EXISTS idx_class_documentations_history_id
        ON class_documentations (class_history_id)
    "#,
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for (step, statement) in SCHEMA.iter().enumerate() {
        debug!("Schema step {}/{}", step + 1, SCHEMA.len());
        sqlx::query(statement)
            .execute(pool)
            .await
            .wrap_err_with(|| format!("Schema step {} failed", step + 1))?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
