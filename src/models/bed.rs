use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::BedStatus;

/// A physical bed in a ward. The coordinator owns the empty↔occupied
/// transitions; ward staff may set reserved/maintenance directly through
/// the repository, outside any cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bed {
    pub id: Uuid,
    pub ward: String,
    /// Per-day room charge for this bed's ward, used by billing.
    pub daily_rate: f64,
    pub status: BedStatus,
}

impl Bed {
    pub fn new(ward: impl Into<String>, daily_rate: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            ward: ward.into(),
            daily_rate,
            status: BedStatus::Empty,
        }
    }

    /// An occupied bed holds exactly one active admission.
    pub fn is_occupied(&self) -> bool {
        self.status == BedStatus::Occupied
    }
}
