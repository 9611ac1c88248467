#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use lessonbook_api::{
    ApiState, build_router,
    middleware::auth::{USER_ID_HEADER, USER_ROLE_HEADER},
};
use lessonbook_core::{
    models::{
        catalog::{Instrument, Package},
        identity::{Identity, Role},
        quota::StudentPackage,
        schedule::TeacherSchedule,
    },
    policy::LedgerPolicy,
    store::{MemoryStore, Store},
};
use serde_json::json;
use uuid::Uuid;

pub fn identity(role: Role) -> Identity {
    Identity::new(Uuid::new_v4(), role)
}

pub fn with_identity(request: TestRequest, user: &Identity) -> TestRequest {
    request
        .add_header(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&user.user_id.to_string()).unwrap(),
        )
        .add_header(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from_static(user.role.as_str()),
        )
}

/// Router over a fresh in-memory store.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn Store> = store.clone();
        let state = Arc::new(ApiState::new(shared, LedgerPolicy::default()));
        let server = TestServer::new(build_router(state)).unwrap();
        Self { server, store }
    }

    pub fn get(&self, path: &str, user: &Identity) -> TestRequest {
        with_identity(self.server.get(path), user)
    }

    pub fn post(&self, path: &str, user: &Identity) -> TestRequest {
        with_identity(self.server.post(path), user)
    }

    pub fn put(&self, path: &str, user: &Identity) -> TestRequest {
        with_identity(self.server.put(path), user)
    }

    pub fn patch(&self, path: &str, user: &Identity) -> TestRequest {
        with_identity(self.server.patch(path), user)
    }

    pub fn delete(&self, path: &str, user: &Identity) -> TestRequest {
        with_identity(self.server.delete(path), user)
    }
}

/// A studio seeded through the HTTP surface: one instrument, a 4-lesson
/// package, a teacher with one Monday slot and a subscribed student.
pub struct Studio {
    pub app: TestApp,
    pub admin: Identity,
    pub teacher: Identity,
    pub student: Identity,
    pub instrument: Instrument,
    pub package: Package,
    pub slot: TeacherSchedule,
    pub entry: StudentPackage,
}

impl Studio {
    pub async fn new() -> Self {
        let app = TestApp::new();
        let admin = identity(Role::Admin);
        let teacher = identity(Role::Teacher);
        let student = identity(Role::Student);

        let instrument: Instrument = app
            .post("/api/instruments", &admin)
            .json(&json!({ "name": "Guitar" }))
            .await
            .json();
        let package: Package = app
            .post("/api/packages", &admin)
            .json(&json!({
                "name": "Guitar 4x",
                "quota": 4,
                "instrument_id": instrument.id,
                "price": 350000
            }))
            .await
            .json();
        app.put(&format!("/api/teachers/{}/instruments", teacher.user_id), &admin)
            .json(&json!({ "instrument_ids": [instrument.id] }))
            .await
            .assert_status_ok();

        let slot = Self::add_slot_for(&app, &teacher, "senin", "10:00", "11:00").await;
        let entry: StudentPackage = app
            .post(&format!("/api/students/{}/packages", student.user_id), &admin)
            .json(&json!({ "package_id": package.id }))
            .await
            .json();

        Self {
            app,
            admin,
            teacher,
            student,
            instrument,
            package,
            slot,
            entry,
        }
    }

    async fn add_slot_for(
        app: &TestApp,
        teacher: &Identity,
        day: &str,
        start: &str,
        end: &str,
    ) -> TeacherSchedule {
        app.post("/api/teacher/availability", teacher)
            .json(&json!({ "day_of_week": day, "start_time": start, "end_time": end }))
            .await
            .json()
    }

    pub async fn add_slot(&self, day: &str, start: &str, end: &str) -> TeacherSchedule {
        Self::add_slot_for(&self.app, &self.teacher, day, start, end).await
    }

    pub async fn subscribe(&self, student: &Identity) -> StudentPackage {
        self.app
            .post(&format!("/api/students/{}/packages", student.user_id), &self.admin)
            .json(&json!({ "package_id": self.package.id }))
            .await
            .json()
    }
}
