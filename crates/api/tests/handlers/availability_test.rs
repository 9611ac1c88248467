use axum::http::StatusCode;
use lessonbook_core::models::{
    identity::Role,
    schedule::{AvailableSlot, DayOfWeek, TeacherSchedule},
};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::test_utils::{Studio, identity};

#[tokio::test]
async fn test_add_and_list_own_slots() {
    let studio = Studio::new().await;

    let response = studio
        .app
        .post("/api/teacher/availability", &studio.teacher)
        .json(&json!({ "day_of_week": "Wednesday", "start_time": "15:00", "end_time": "16:30" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let slot: TeacherSchedule = response.json();
    assert_eq!(slot.day_of_week, DayOfWeek::Wednesday);
    assert!(!slot.is_booked);

    let own: Vec<TeacherSchedule> = studio
        .app
        .get("/api/teacher/availability", &studio.teacher)
        .await
        .json();
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|s| s.teacher_id == studio.teacher.user_id));
}

#[tokio::test]
async fn test_overlapping_slot_is_rejected() {
    let studio = Studio::new().await;

    let response = studio
        .app
        .post("/api/teacher/availability", &studio.teacher)
        .json(&json!({ "day_of_week": "senin", "start_time": "10:30", "end_time": "11:30" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_slot_is_rejected() {
    let studio = Studio::new().await;

    for body in [
        json!({ "day_of_week": "someday", "start_time": "10:00", "end_time": "11:00" }),
        json!({ "day_of_week": "selasa", "start_time": "11:00", "end_time": "10:00" }),
        json!({ "day_of_week": "selasa", "start_time": "25:00", "end_time": "26:00" }),
    ] {
        studio
            .app
            .post("/api/teacher/availability", &studio.teacher)
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    studio
        .app
        .post("/api/teacher/availability", &studio.student)
        .json(&json!({ "day_of_week": "selasa", "start_time": "10:00", "end_time": "11:00" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_slot() {
    let studio = Studio::new().await;
    let path = format!("/api/teacher/availability/{}", studio.slot.id);

    studio
        .app
        .delete(&path, &identity(Role::Teacher))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    studio
        .app
        .delete(&path, &studio.teacher)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let own: Vec<TeacherSchedule> = studio
        .app
        .get("/api/teacher/availability", &studio.teacher)
        .await
        .json();
    assert!(own.is_empty());
}

#[tokio::test]
async fn test_free_slot_search() {
    let studio = Studio::new().await;
    let friday = studio.add_slot("jumat", "09:00", "10:00").await;

    let all: Vec<TeacherSchedule> = studio
        .app
        .server
        .get(&format!("/api/schedules/free?instrument_ids={}", studio.instrument.id))
        .await
        .json();
    assert_eq!(all.len(), 2);

    // jumat..senin wraps over the weekend and covers both slots
    let wrapped: Vec<TeacherSchedule> = studio
        .app
        .server
        .get(&format!(
            "/api/schedules/free?instrument_ids={}&from=jumat&to=senin",
            studio.instrument.id
        ))
        .await
        .json();
    assert_eq!(wrapped.len(), 2);

    let fridays: Vec<TeacherSchedule> = studio
        .app
        .server
        .get(&format!(
            "/api/schedules/free?instrument_ids={}&from=jumat&to=jumat",
            studio.instrument.id
        ))
        .await
        .json();
    assert_eq!(fridays, vec![friday]);

    let none: Vec<TeacherSchedule> = studio.app.server.get("/api/schedules/free").await.json();
    assert!(none.is_empty());

    studio
        .app
        .server
        .get("/api/schedules/free?instrument_ids=piano")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bookable_slots_follow_student_packages() {
    let studio = Studio::new().await;

    let slots: Vec<AvailableSlot> = studio
        .app
        .get("/api/student/schedules/available", &studio.student)
        .await
        .json();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].schedule.id, studio.slot.id);

    let outsider = identity(Role::Student);
    let slots: Vec<AvailableSlot> = studio
        .app
        .get("/api/student/schedules/available", &outsider)
        .await
        .json();
    assert!(slots.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_clear_a_whole_day() {
    let studio = Studio::new().await;
    studio.add_slot("kamis", "09:00", "10:00").await;
    studio.add_slot("kamis", "13:00", "14:00").await;

    let cleared: serde_json::Value = studio
        .app
        .delete("/api/teacher/days/kamis/availability", &studio.teacher)
        .await
        .json();
    assert_eq!(cleared, json!({ "day_of_week": "kamis", "deleted": 2 }));

    let mine: Vec<TeacherSchedule> = studio
        .app
        .get("/api/teacher/availability", &studio.teacher)
        .await
        .json();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].day_of_week, DayOfWeek::Monday);

    // the Monday slot is booked, so Monday stays as it is
    studio
        .app
        .post("/api/student/bookings", &studio.student)
        .json(&json!({ "schedule_id": studio.slot.id }))
        .await
        .assert_status(StatusCode::CREATED);
    studio
        .app
        .delete("/api/teacher/days/senin/availability", &studio.teacher)
        .await
        .assert_status(StatusCode::CONFLICT);
    studio
        .app
        .delete("/api/teacher/days/someday/availability", &studio.teacher)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    studio
        .app
        .delete("/api/teacher/days/senin/availability", &studio.admin)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
