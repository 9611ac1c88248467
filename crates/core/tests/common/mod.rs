#![allow(dead_code)]

use lessonbook_core::{
    errors::BookingResult,
    models::{
        booking::{Booking, CreateBookingRequest},
        catalog::{InstrumentRequest, Package, PackageRequest},
        identity::{Identity, Role},
        quota::StudentPackage,
        schedule::{AddAvailabilityRequest, DayOfWeek, TeacherSchedule},
    },
    policy::LedgerPolicy,
    services::{availability, booking, catalog, quota},
    store::{MemoryStore, Store, StoreTx},
};
use chrono::{Datelike, Utc};
use uuid::Uuid;

pub fn admin() -> Identity {
    Identity::new(Uuid::new_v4(), Role::Admin)
}

pub fn manager() -> Identity {
    Identity::new(Uuid::new_v4(), Role::Manager)
}

pub fn teacher() -> Identity {
    Identity::new(Uuid::new_v4(), Role::Teacher)
}

pub fn student() -> Identity {
    Identity::new(Uuid::new_v4(), Role::Student)
}

/// A studio with one instrument, one package for it and one teacher
/// teaching it.
pub struct Studio {
    pub store: MemoryStore,
    pub policy: LedgerPolicy,
    pub admin: Identity,
    pub teacher: Identity,
    pub instrument_id: Uuid,
    pub package: Package,
}

impl Studio {
    pub async fn new() -> Self {
        Self::with_quota(4).await
    }

    pub async fn with_quota(quota: i32) -> Self {
        let store = MemoryStore::new();
        let admin = admin();
        let teacher = teacher();

        let instrument = catalog::create_instrument(
            &store,
            &admin,
            &InstrumentRequest {
                name: "Piano".to_string(),
            },
        )
        .await
        .expect("Failed to create instrument");
        let package = catalog::create_package(
            &store,
            &admin,
            &PackageRequest {
                name: format!("Piano {}x", quota),
                quota,
                instrument_id: instrument.id,
                duration_minutes: 60,
                description: "Weekly piano lessons".to_string(),
                price: 400_000,
            },
        )
        .await
        .expect("Failed to create package");
        catalog::set_teacher_instruments(&store, &admin, teacher.user_id, &[instrument.id])
            .await
            .expect("Failed to assign teacher instruments");

        Self {
            store,
            policy: LedgerPolicy::default(),
            admin,
            teacher,
            instrument_id: instrument.id,
            package,
        }
    }

    pub async fn slot(&self, day: &str, start: &str, end: &str) -> TeacherSchedule {
        availability::add_availability(
            &self.store,
            &self.teacher,
            &AddAvailabilityRequest::new(day, start, end),
        )
        .await
        .expect("Failed to add availability")
    }

    /// Another teacher of the studio's instrument.
    pub async fn colleague(&self) -> Identity {
        let colleague = teacher();
        catalog::set_teacher_instruments(&self.store, &self.admin, colleague.user_id, &[self.instrument_id])
            .await
            .expect("Failed to assign teacher instruments");
        colleague
    }

    pub async fn slot_of(&self, teacher: &Identity, day: &str, start: &str, end: &str) -> TeacherSchedule {
        availability::add_availability(&self.store, teacher, &AddAvailabilityRequest::new(day, start, end))
            .await
            .expect("Failed to add availability")
    }

    pub async fn subscribed_student(&self) -> (Identity, StudentPackage) {
        let student = student();
        let entry = quota::assign_package(
            &self.store,
            &self.policy,
            &self.admin,
            student.user_id,
            self.package.id,
        )
        .await
        .expect("Failed to assign package");
        (student, entry)
    }

    pub async fn try_book(&self, student: &Identity, schedule_id: Uuid) -> BookingResult<Booking> {
        booking::create_booking(
            &self.store,
            &self.policy,
            student,
            &CreateBookingRequest {
                schedule_id,
                instrument_id: None,
            },
        )
        .await
    }

    pub async fn book(&self, student: &Identity, schedule_id: Uuid) -> Booking {
        booking::create_booking(
            &self.store,
            &self.policy,
            student,
            &CreateBookingRequest {
                schedule_id,
                instrument_id: None,
            },
        )
        .await
        .expect("Failed to create booking")
    }

    pub async fn schedule(&self, id: Uuid) -> TeacherSchedule {
        let mut tx = self.store.begin().await.unwrap();
        tx.schedule(id).await.unwrap().expect("schedule exists")
    }

    pub async fn entry(&self, id: Uuid) -> StudentPackage {
        let mut tx = self.store.begin().await.unwrap();
        tx.student_package_for_update(id)
            .await
            .unwrap()
            .expect("student package exists")
    }

    pub async fn set_remaining(&self, id: Uuid, remaining: i32) {
        let mut tx = self.store.begin().await.unwrap();
        tx.set_remaining_quota(id, remaining).await.unwrap();
        tx.commit().await.unwrap();
    }
}

/// Inserts a ledger entry directly, bypassing assignment rules.
pub async fn insert_entry(store: &dyn Store, entry: &StudentPackage) {
    let mut tx: Box<dyn StoreTx> = store.begin().await.unwrap();
    tx.insert_student_package(entry).await.unwrap();
    tx.commit().await.unwrap();
}

/// Wire name of the day `offset` days after today on the studio clock.
pub fn day_after_today(policy: &LedgerPolicy, offset: u32) -> &'static str {
    let today = Utc::now()
        .with_timezone(&policy.timezone)
        .weekday()
        .num_days_from_monday();
    DayOfWeek::ALL[((today + offset) % 7) as usize].as_str()
}
