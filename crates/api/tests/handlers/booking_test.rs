use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use lessonbook_core::models::{
    booking::{Booking, BookingStatus},
    history::{ClassDocumentation, ClassHistory},
    identity::{Identity, Role},
    quota::{StudentPackage, StudentPackageResponse},
    schedule::{DayOfWeek, TeacherSchedule},
};
use lessonbook_core::policy::LedgerPolicy;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::test_utils::{Studio, identity};

async fn book(studio: &Studio, student: &Identity, schedule: &TeacherSchedule) -> Booking {
    let response = studio
        .app
        .post("/api/student/bookings", student)
        .json(&json!({ "schedule_id": schedule.id }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn remaining(studio: &Studio, student: &Identity) -> i32 {
    let packages: Vec<StudentPackageResponse> = studio
        .app
        .get("/api/student/packages", student)
        .await
        .json();
    packages[0].entry.remaining_quota
}

#[tokio::test]
async fn test_book_finish_and_document() {
    let studio = Studio::new().await;

    let booking = book(&studio, &studio.student, &studio.slot).await;
    assert_eq!(booking.status, BookingStatus::Booked);
    assert_eq!(booking.student_package_id, studio.entry.id);
    assert_eq!(remaining(&studio, &studio.student).await, 3);

    let teacher_view: Vec<Booking> = studio
        .app
        .get("/api/teacher/bookings", &studio.teacher)
        .await
        .json();
    assert_eq!(teacher_view, vec![booking.clone()]);

    let finish_path = format!("/api/teacher/bookings/{}/finish", booking.id);
    let response = studio
        .app
        .put(&finish_path, &studio.teacher)
        .json(&json!({
            "notes": "Worked on scales",
            "documentation_urls": ["https://videos.example.com/lesson-1"]
        }))
        .await;
    response.assert_status_ok();
    let archived: ClassHistory = response.json();
    assert_eq!(archived.booking_id, booking.id);
    assert_eq!(archived.status, BookingStatus::Completed);
    assert_eq!(archived.notes.as_deref(), Some("Worked on scales"));
    assert_eq!(archived.documentations.len(), 1);

    studio
        .app
        .put(&finish_path, &studio.teacher)
        .await
        .assert_status(StatusCode::CONFLICT);

    let doc_path = format!("/api/teacher/history/{}/documentation", archived.id);
    studio
        .app
        .post(&doc_path, &studio.teacher)
        .json(&json!({ "url": "ftp://files.example.com/sheet.pdf" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    studio
        .app
        .post(&doc_path, &identity(Role::Teacher))
        .json(&json!({ "url": "https://files.example.com/sheet.pdf" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    let response = studio
        .app
        .post(&doc_path, &studio.teacher)
        .json(&json!({ "url": "https://files.example.com/sheet.pdf" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let _: ClassDocumentation = response.json();

    let history: Vec<ClassHistory> = studio
        .app
        .get("/api/student/history", &studio.student)
        .await
        .json();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].documentations.len(), 2);

    let teacher_history: Vec<ClassHistory> = studio
        .app
        .get("/api/teacher/history", &studio.teacher)
        .await
        .json();
    assert_eq!(teacher_history.len(), 1);

    // finishing a lesson does not give the lesson back
    assert_eq!(remaining(&studio, &studio.student).await, 3);
}

#[tokio::test]
async fn test_taken_slot_and_missing_package() {
    let studio = Studio::new().await;
    book(&studio, &studio.student, &studio.slot).await;

    let rival = identity(Role::Student);
    studio.subscribe(&rival).await;
    studio
        .app
        .post("/api/student/bookings", &rival)
        .json(&json!({ "schedule_id": studio.slot.id }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let free = studio.add_slot("kamis", "13:00", "14:00").await;
    let response = studio
        .app
        .post("/api/student/bookings", &identity(Role::Student))
        .json(&json!({ "schedule_id": free.id }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<serde_json::Value>()["kind"], "not_subscribed");

    studio
        .app
        .post("/api/student/bookings", &studio.teacher)
        .json(&json!({ "schedule_id": free.id }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_frees_slot_and_restores_quota() {
    let studio = Studio::new().await;
    let booking = book(&studio, &studio.student, &studio.slot).await;
    assert_eq!(remaining(&studio, &studio.student).await, 3);

    let response = studio
        .app
        .put(&format!("/api/teacher/bookings/{}/cancel", booking.id), &studio.teacher)
        .json(&json!({ "reason": "Teacher is ill" }))
        .await;
    response.assert_status_ok();
    let cancelled: Booking = response.json();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by, Some(studio.teacher.user_id));
    assert_eq!(cancelled.notes.as_deref(), Some("Teacher is ill"));
    assert_eq!(remaining(&studio, &studio.student).await, 4);

    let other = identity(Role::Student);
    studio.subscribe(&other).await;
    book(&studio, &other, &studio.slot).await;
}

#[tokio::test]
async fn test_cancel_without_body() {
    let studio = Studio::new().await;
    let booking = book(&studio, &studio.student, &studio.slot).await;
    let path = format!("/api/teacher/bookings/{}/cancel", booking.id);

    studio
        .app
        .put(&path, &identity(Role::Teacher))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let cancelled: Booking = studio.app.put(&path, &studio.admin).await.json();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.notes, None);

    studio
        .app
        .put(&path, &studio.admin)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reschedule_keeps_quota() {
    let studio = Studio::new().await;
    let booking = book(&studio, &studio.student, &studio.slot).await;
    let tuesday = studio.add_slot("selasa", "16:00", "17:00").await;

    let response = studio
        .app
        .put(&format!("/api/student/bookings/{}/reschedule", booking.id), &studio.student)
        .json(&json!({ "schedule_id": tuesday.id }))
        .await;
    response.assert_status_ok();
    let moved: Booking = response.json();
    assert_eq!(moved.schedule_id, tuesday.id);
    assert_eq!(moved.student_package_id, booking.student_package_id);

    let bookings: Vec<Booking> = studio
        .app
        .get("/api/student/bookings", &studio.student)
        .await
        .json();
    let old = bookings.iter().find(|b| b.id == booking.id).unwrap();
    assert_eq!(old.status, BookingStatus::Rescheduled);
    assert_eq!(remaining(&studio, &studio.student).await, 3);

    let own: Vec<TeacherSchedule> = studio
        .app
        .get("/api/teacher/availability", &studio.teacher)
        .await
        .json();
    let monday = own.iter().find(|s| s.id == studio.slot.id).unwrap();
    assert!(!monday.is_booked);

    studio
        .app
        .put(&format!("/api/student/bookings/{}/reschedule", moved.id), &identity(Role::Student))
        .json(&json!({ "schedule_id": studio.slot.id }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_modify_quota_clamps_and_blocks_booking() {
    let studio = Studio::new().await;
    let manager = identity(Role::Manager);
    let path = format!(
        "/api/students/{}/packages/{}/quota",
        studio.student.user_id, studio.package.id
    );

    studio
        .app
        .patch(&path, &studio.student)
        .json(&json!({ "delta": 5 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let entry: StudentPackage = studio
        .app
        .patch(&path, &manager)
        .json(&json!({ "delta": -10 }))
        .await
        .json();
    assert_eq!(entry.remaining_quota, 0);

    let response = studio
        .app
        .post("/api/student/bookings", &studio.student)
        .json(&json!({ "schedule_id": studio.slot.id }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<serde_json::Value>()["kind"], "quota_exhausted");

    let entry: StudentPackage = studio
        .app
        .patch(&path, &manager)
        .json(&json!({ "delta": 10 }))
        .await
        .json();
    assert_eq!(entry.remaining_quota, studio.package.quota);
}

#[tokio::test]
async fn test_assigning_active_package_twice_conflicts() {
    let studio = Studio::new().await;

    studio
        .app
        .post(&format!("/api/students/{}/packages", studio.student.user_id), &studio.admin)
        .json(&json!({ "package_id": studio.package.id }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let packages: Vec<StudentPackageResponse> = studio
        .app
        .get(&format!("/api/students/{}/packages", studio.student.user_id), &studio.admin)
        .await
        .json();
    assert_eq!(packages.len(), 1);
    assert!(packages[0].is_active);
    assert_eq!(packages[0].package_name, "Guitar 4x");
}

/// Weekday three days from now on the studio clock, so a lesson there is
/// always more than a day away.
fn three_days_ahead() -> &'static str {
    let today = Utc::now()
        .with_timezone(&LedgerPolicy::default().timezone)
        .weekday()
        .num_days_from_monday();
    DayOfWeek::ALL[((today + 3) % 7) as usize].as_str()
}

#[test_log::test(tokio::test)]
async fn test_malformed_finish_body_is_rejected() {
    let studio = Studio::new().await;
    let booking = book(&studio, &studio.student, &studio.slot).await;
    let path = format!("/api/teacher/bookings/{}/finish", booking.id);

    // a single url instead of a list
    studio
        .app
        .put(&path, &studio.teacher)
        .json(&json!({
            "notes": "Scales",
            "documentation_urls": "https://v.example.com/1"
        }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    studio
        .app
        .put(&path, &studio.teacher)
        .bytes("{\"notes\":".into())
        .content_type("application/json")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    studio
        .app
        .put(&path, &studio.teacher)
        .text("Scales")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // still booked, nothing archived
    let teacher_view: Vec<Booking> = studio
        .app
        .get("/api/teacher/bookings", &studio.teacher)
        .await
        .json();
    assert_eq!(teacher_view[0].status, BookingStatus::Booked);
    let archive: Vec<ClassHistory> = studio
        .app
        .get("/api/teacher/history", &studio.teacher)
        .await
        .json();
    assert!(archive.is_empty());

    let response = studio.app.put(&path, &studio.teacher).await;
    response.assert_status_ok();
    let archived: ClassHistory = response.json();
    assert_eq!(archived.notes, None);
    assert!(archived.documentations.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_malformed_cancel_body_is_rejected() {
    let studio = Studio::new().await;
    let booking = book(&studio, &studio.student, &studio.slot).await;

    studio
        .app
        .put(&format!("/api/teacher/bookings/{}/cancel", booking.id), &studio.teacher)
        .json(&json!({ "reason": ["ill"] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(remaining(&studio, &studio.student).await, 3);
}

#[test_log::test(tokio::test)]
async fn test_student_cancels_own_booking() {
    let studio = Studio::new().await;
    let slot = studio.add_slot(three_days_ahead(), "15:00", "16:00").await;
    let booking = book(&studio, &studio.student, &slot).await;
    let path = format!("/api/student/bookings/{}/cancel", booking.id);

    let stranger = identity(Role::Student);
    studio
        .app
        .put(&path, &stranger)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = studio
        .app
        .put(&path, &studio.student)
        .json(&json!({ "reason": "Exams" }))
        .await;
    response.assert_status_ok();
    let cancelled: Booking = response.json();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by, Some(studio.student.user_id));
    assert_eq!(remaining(&studio, &studio.student).await, 4);
}

#[test_log::test(tokio::test)]
async fn test_admin_sees_every_history() {
    let studio = Studio::new().await;
    let booking = book(&studio, &studio.student, &studio.slot).await;
    studio
        .app
        .put(&format!("/api/teacher/bookings/{}/finish", booking.id), &studio.teacher)
        .await
        .assert_status_ok();

    let archive: Vec<ClassHistory> = studio.app.get("/api/admin/history", &studio.admin).await.json();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].booking_id, booking.id);

    studio
        .app
        .get("/api/admin/history", &studio.teacher)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
