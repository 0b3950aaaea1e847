use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::PatientStatus;

/// Patient identity + demographics. `status` is mutated only by the
/// admission coordinator; rows are never deleted, only superseded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub status: PatientStatus,
}

impl Patient {
    pub fn new(name: impl Into<String>, contact: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            contact,
            status: PatientStatus::Waiting,
        }
    }
}
