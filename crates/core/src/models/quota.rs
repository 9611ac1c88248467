use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One quota-ledger entry: a package issued to a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentPackage {
    pub id: Uuid,
    pub student_id: Uuid,
    pub package_id: Uuid,
    /// Lessons granted at assignment. Later package edits leave it alone.
    pub quota: i32,
    pub remaining_quota: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl StudentPackage {
    /// Within its validity window, whatever the remaining quota.
    pub fn is_unexpired(&self, now: DateTime<Utc>) -> bool {
        self.end_date >= now
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.is_unexpired(now) && self.remaining_quota > 0
    }

    /// `remaining_quota + delta` clamped to `[0, quota]`.
    pub fn adjusted_quota(&self, delta: i32) -> i32 {
        self.remaining_quota
            .saturating_add(delta)
            .clamp(0, self.quota.max(0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignPackageRequest {
    pub package_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyQuotaRequest {
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentPackageResponse {
    #[serde(flatten)]
    pub entry: StudentPackage,
    pub package_name: String,
    pub instrument_id: Uuid,
    pub duration_minutes: i32,
    pub is_active: bool,
}
