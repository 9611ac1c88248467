use axum::http::StatusCode;
use lessonbook_core::models::{
    catalog::{Instrument, Package, TeacherInstrumentsResponse},
    identity::Role,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::test_utils::{TestApp, identity};

#[tokio::test]
async fn test_instrument_lifecycle() {
    let app = TestApp::new();
    let admin = identity(Role::Admin);

    let response = app
        .post("/api/instruments", &admin)
        .json(&json!({ "name": "  Violin " }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let violin: Instrument = response.json();
    assert_eq!(violin.name, "Violin");

    let renamed: Instrument = app
        .put(&format!("/api/instruments/{}", violin.id), &admin)
        .json(&json!({ "name": "Viola" }))
        .await
        .json();
    assert_eq!(renamed.id, violin.id);
    assert_eq!(renamed.name, "Viola");

    let listed: Vec<Instrument> = app.server.get("/api/instruments").await.json();
    assert_eq!(listed, vec![renamed]);

    app.delete(&format!("/api/instruments/{}", violin.id), &admin)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let listed: Vec<Instrument> = app.server.get("/api/instruments").await.json();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_duplicate_instrument_name() {
    let app = TestApp::new();
    let admin = identity(Role::Admin);

    app.post("/api/instruments", &admin)
        .json(&json!({ "name": "Drums" }))
        .await
        .assert_status(StatusCode::CREATED);
    let response = app
        .post("/api/instruments", &admin)
        .json(&json!({ "name": "drums" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_catalog_mutations_are_admin_only() {
    let app = TestApp::new();

    for role in [Role::Manager, Role::Teacher, Role::Student] {
        app.post("/api/instruments", &identity(role))
            .json(&json!({ "name": "Cello" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_package_validation_and_update() {
    let app = TestApp::new();
    let admin = identity(Role::Admin);
    let piano: Instrument = app
        .post("/api/instruments", &admin)
        .json(&json!({ "name": "Piano" }))
        .await
        .json();

    app.post("/api/packages", &admin)
        .json(&json!({ "name": "Empty", "quota": 0, "instrument_id": piano.id }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let package: Package = app
        .post("/api/packages", &admin)
        .json(&json!({ "name": "Piano 8x", "quota": 8, "instrument_id": piano.id, "price": 700000 }))
        .await
        .json();
    assert_eq!(package.quota, 8);
    assert_eq!(package.description, "");

    let updated: Package = app
        .put(&format!("/api/packages/{}", package.id), &admin)
        .json(&json!({
            "name": "Piano 8x",
            "quota": 10,
            "instrument_id": piano.id,
            "description": "Two months",
            "price": 800000
        }))
        .await
        .json();
    assert_eq!(updated.quota, 10);
    assert_eq!(updated.price, 800000);

    let listed: Vec<Package> = app.server.get("/api/packages").await.json();
    assert_eq!(listed, vec![updated]);
}

#[tokio::test]
async fn test_teacher_instruments() {
    let app = TestApp::new();
    let admin = identity(Role::Admin);
    let teacher = identity(Role::Teacher);
    let piano: Instrument = app
        .post("/api/instruments", &admin)
        .json(&json!({ "name": "Piano" }))
        .await
        .json();

    let path = format!("/api/teachers/{}/instruments", teacher.user_id);
    app.put(&path, &admin)
        .json(&json!({ "instrument_ids": [uuid::Uuid::new_v4()] }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let assigned: TeacherInstrumentsResponse = app
        .put(&path, &admin)
        .json(&json!({ "instrument_ids": [piano.id] }))
        .await
        .json();
    assert_eq!(assigned.instrument_ids, vec![piano.id]);

    let fetched: TeacherInstrumentsResponse = app.server.get(&path).await.json();
    assert_eq!(fetched.teacher_id, teacher.user_id);
    assert_eq!(fetched.instrument_ids, vec![piano.id]);
}
