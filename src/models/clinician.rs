use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ClinicianAvailability;

/// An attending clinician. Availability is shared ownership: staff may flip
/// it at any time, so discharge only restores it best-effort and only when
/// the clinician holds no other active admission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinician {
    pub id: Uuid,
    pub name: String,
    pub specialty: Option<String>,
    pub availability: ClinicianAvailability,
}

impl Clinician {
    pub fn new(name: impl Into<String>, specialty: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            specialty,
            availability: ClinicianAvailability::Available,
        }
    }
}
