//! Admission coordinator — the only component allowed to touch more than one
//! entity per call.
//!
//! `admit` and `discharge` each run as one all-or-nothing unit inside an
//! IMMEDIATE transaction: the admission row, the bed flip and the patient
//! status commit together or not at all. Racing callers are decided by the
//! guarded compare-and-set updates in the repository (exactly one admit wins
//! an empty bed; a second discharge fails loudly instead of double-freeing a
//! bed that may since have been reassigned).

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repository;
use crate::error::LifecycleError;
use crate::models::enums::{AdmissionStatus, ClinicianAvailability, PatientStatus};
use crate::models::Admission;

/// Inbound admit command.
#[derive(Debug, Clone, Deserialize)]
pub struct AdmitRequest {
    pub patient_id: Uuid,
    pub clinician_id: Option<Uuid>,
    pub bed_id: Uuid,
    pub diagnosis: Option<String>,
}

/// The identifiers freed by a discharge, returned so the caller can cascade
/// further (billing settlement, clinician availability, notifications).
#[derive(Debug, Clone, Serialize)]
pub struct DischargeOutcome {
    pub patient_id: Uuid,
    pub bed_id: Uuid,
    pub clinician_id: Option<Uuid>,
}

/// Admit a patient to a bed.
///
/// Preconditions: the patient exists and holds no active admission; the bed
/// exists and is empty. Any precondition failure leaves no state behind.
pub fn admit(conn: &mut Connection, req: AdmitRequest) -> Result<Admission, LifecycleError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let patient = repository::get_patient(&tx, &req.patient_id)?.ok_or(
        LifecycleError::NotFound { entity: "patient", id: req.patient_id },
    )?;
    if let Some(existing) = repository::active_admission_for_patient(&tx, &patient.id)? {
        return Err(LifecycleError::Conflict(format!(
            "patient {} already admitted (admission {})",
            patient.id, existing.id
        )));
    }

    let bed = repository::get_bed(&tx, &req.bed_id)?.ok_or(LifecycleError::NotFound {
        entity: "bed",
        id: req.bed_id,
    })?;
    // Check-and-set in one statement: only one racing admit sees a changed row.
    if !repository::claim_bed(&tx, &bed.id)? {
        return Err(LifecycleError::Conflict(format!(
            "bed {} is not empty (status: {})",
            bed.id,
            bed.status.as_str()
        )));
    }

    if let Some(clinician_id) = req.clinician_id {
        repository::get_clinician(&tx, &clinician_id)?.ok_or(LifecycleError::NotFound {
            entity: "clinician",
            id: clinician_id,
        })?;
        repository::set_clinician_availability(&tx, &clinician_id, ClinicianAvailability::Busy)?;
    }

    let admission = Admission {
        id: Uuid::new_v4(),
        patient_id: req.patient_id,
        bed_id: req.bed_id,
        clinician_id: req.clinician_id,
        diagnosis: req.diagnosis,
        admit_date: Utc::now().naive_utc(),
        discharge_date: None,
        status: AdmissionStatus::Active,
    };
    repository::insert_admission(&tx, &admission)?;
    repository::set_patient_status(&tx, &req.patient_id, PatientStatus::Admitted)?;

    tx.commit()?;

    tracing::info!(
        admission = %admission.id,
        patient = %admission.patient_id,
        bed = %admission.bed_id,
        "Patient admitted"
    );
    Ok(admission)
}

/// Discharge an admission: close it, free the bed, mark the patient
/// discharged. A second call for the same admission fails with
/// `AlreadyDischarged` — never a silent success.
pub fn discharge(
    conn: &mut Connection,
    admission_id: &Uuid,
) -> Result<DischargeOutcome, LifecycleError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let outcome = discharge_in_tx(&tx, admission_id)?;
    tx.commit()?;

    tracing::info!(
        admission = %admission_id,
        patient = %outcome.patient_id,
        bed = %outcome.bed_id,
        "Patient discharged"
    );
    Ok(outcome)
}

/// The discharge unit itself, running against an already-open transaction so
/// the billing cascade can bind it to the invoice settlement: if either
/// fails, the caller's rollback reverts both.
pub(crate) fn discharge_in_tx(
    conn: &Connection,
    admission_id: &Uuid,
) -> Result<DischargeOutcome, LifecycleError> {
    let admission = repository::get_admission(conn, admission_id)?.ok_or(
        LifecycleError::NotFound { entity: "admission", id: *admission_id },
    )?;
    if admission.status != AdmissionStatus::Active {
        return Err(LifecycleError::AlreadyDischarged(*admission_id));
    }

    let now = Utc::now().naive_utc();
    if !repository::close_admission(conn, admission_id, &now)? {
        // A racing discharge closed it between the read and the update.
        return Err(LifecycleError::AlreadyDischarged(*admission_id));
    }

    if !repository::release_bed(conn, &admission.bed_id)? {
        // Active admission over a non-occupied bed: already inconsistent
        // (e.g. ward staff flipped the bed to maintenance). Discharging
        // repairs the admission side; leave the staff-owned status alone.
        tracing::warn!(
            bed = %admission.bed_id,
            admission = %admission_id,
            "Discharged admission held a bed that was not occupied"
        );
    }

    repository::set_patient_status(conn, &admission.patient_id, PatientStatus::Discharged)?;

    Ok(DischargeOutcome {
        patient_id: admission.patient_id,
        bed_id: admission.bed_id,
        clinician_id: admission.clinician_id,
    })
}

/// Best-effort follow-up: restore the clinician to available, but only when
/// no other active admission still names them. Returns whether a restore
/// happened. Runs outside the atomic unit; failures never roll it back.
pub fn restore_clinician(
    conn: &Connection,
    clinician_id: &Uuid,
) -> Result<bool, LifecycleError> {
    if repository::clinician_active_admissions(conn, clinician_id)? > 0 {
        return Ok(false);
    }
    repository::set_clinician_availability(conn, clinician_id, ClinicianAvailability::Available)?;
    Ok(true)
}

/// Bed occupancy invariant check: `occupied` iff exactly one active
/// admission references the bed. Exposed for the read-view validator.
pub fn bed_occupancy_consistent(
    conn: &Connection,
    bed_id: &Uuid,
) -> Result<bool, LifecycleError> {
    let bed = repository::get_bed(conn, bed_id)?.ok_or(LifecycleError::NotFound {
        entity: "bed",
        id: *bed_id,
    })?;
    let active = repository::active_admission_for_bed(conn, bed_id)?;
    Ok(bed.is_occupied() == active.is_some())
}
