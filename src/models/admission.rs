use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AdmissionStatus;

/// The record linking a patient, a bed and (optionally) a clinician for one
/// hospital stay. Created by `admit`, closed by `discharge`, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admission {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub bed_id: Uuid,
    pub clinician_id: Option<Uuid>,
    pub diagnosis: Option<String>,
    pub admit_date: NaiveDateTime,
    pub discharge_date: Option<NaiveDateTime>,
    pub status: AdmissionStatus,
}

impl Admission {
    pub fn is_active(&self) -> bool {
        self.status == AdmissionStatus::Active
    }

    /// Whole days occupied, counting a same-day stay as one day.
    /// Open admissions are measured against `until`.
    pub fn occupied_days(&self, until: NaiveDateTime) -> i64 {
        let end = self.discharge_date.unwrap_or(until);
        (end.date() - self.admit_date.date()).num_days().max(1)
    }
}
