//! Billing cascade — invoice settlement composed over the admission
//! coordinator.
//!
//! `settle_and_discharge` is the richer discharge path used when an invoice
//! exists. Its core (freeze totals + mark paid + discharge) is one atomic
//! unit: a paid invoice must never coexist with a still-active admission, so
//! a discharge failure rolls the settlement back to pending. The follow-up
//! steps (clinician restore, notification) are best-effort and can only
//! downgrade the result, never undo it.
//!
//! Ordered steps replace the UI callback chain this grew out of; progress is
//! tracked as `Pending → CoreCommitted → BestEffortApplied |
//! BestEffortDegraded`.

use chrono::{NaiveDateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admission;
use crate::db::repository;
use crate::error::LifecycleError;
use crate::models::enums::{InvoiceStatus, NotificationKind};
use crate::models::{Admission, Bed, Invoice};
use crate::notify::NotificationHub;

/// Inbound settlement command.
#[derive(Debug, Clone, Deserialize)]
pub struct SettleRequest {
    pub invoice_id: Uuid,
    pub payment_method: String,
    pub notes: Option<String>,
}

/// Cascade progress. The core commits as a whole; the best-effort phase
/// decides which terminal state the cascade lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStatus {
    Pending,
    CoreCommitted,
    BestEffortApplied,
    BestEffortDegraded,
}

/// What a settlement freed, for UI display.
#[derive(Debug, Clone, Serialize)]
pub struct CascadeResult {
    pub patient_name: String,
    pub bed_id: Uuid,
    pub doctor_name: Option<String>,
    pub status: CascadeStatus,
    /// Human-readable descriptions of best-effort steps that failed.
    /// Empty unless `status` is `BestEffortDegraded`.
    pub warnings: Vec<String>,
}

/// Frozen invoice totals.
///
/// `grand_total = round((subtotal − discount) × (1 + tax_rate))`, rounded to
/// the whole currency unit; `tax` is derived from the rounded grand total so
/// the frozen columns always reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InvoiceTotals {
    pub room_charge: f64,
    pub occupied_days: i64,
    pub subtotal: f64,
    pub discount: f64,
    pub tax: f64,
    pub grand_total: f64,
}

/// Compute the final totals for an invoice against its admission's stay.
pub fn compute_totals(
    invoice: &Invoice,
    admission: &Admission,
    bed: &Bed,
    now: NaiveDateTime,
) -> InvoiceTotals {
    let occupied_days = admission.occupied_days(now);
    let room_charge = occupied_days as f64 * bed.daily_rate;
    let subtotal = invoice.items_total() + room_charge;
    let discount = subtotal * invoice.discount_pct / 100.0;
    let taxable = subtotal - discount;
    let grand_total = (taxable * (1.0 + invoice.tax_rate)).round();
    InvoiceTotals {
        room_charge,
        occupied_days,
        subtotal,
        discount,
        tax: grand_total - taxable,
        grand_total,
    }
}

/// Settle an invoice and discharge its linked admission.
///
/// Preconditions: the invoice exists, is pending and is linked to an
/// admission. Freezing the totals and marking the invoice paid is the point
/// of no return — but it shares its transaction with the discharge, so if
/// the admission cannot be discharged (missing, already closed) the
/// settlement never commits and the invoice stays pending.
pub fn settle_and_discharge(
    conn: &mut Connection,
    hub: &NotificationHub,
    req: SettleRequest,
) -> Result<CascadeResult, LifecycleError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let invoice = repository::get_invoice(&tx, &req.invoice_id)?.ok_or(
        LifecycleError::NotFound { entity: "invoice", id: req.invoice_id },
    )?;
    if invoice.status != InvoiceStatus::Pending {
        return Err(LifecycleError::AlreadyPaid(invoice.id));
    }
    let admission_id = invoice.admission_id.ok_or_else(|| {
        LifecycleError::Conflict(format!(
            "invoice {} is not linked to an admission; settle it manually",
            invoice.id
        ))
    })?;
    let admission = repository::get_admission(&tx, &admission_id)?.ok_or(
        LifecycleError::NotFound { entity: "admission", id: admission_id },
    )?;
    let bed = repository::get_bed(&tx, &admission.bed_id)?.ok_or(
        LifecycleError::NotFound { entity: "bed", id: admission.bed_id },
    )?;

    let now = Utc::now().naive_utc();
    let totals = compute_totals(&invoice, &admission, &bed, now);

    // Point of no return within this unit: freeze totals, flip to paid.
    if !repository::settle_invoice(
        &tx,
        &invoice.id,
        totals.subtotal,
        totals.tax,
        totals.grand_total,
        &req.payment_method,
        &now,
        req.notes.as_deref(),
    )? {
        return Err(LifecycleError::AlreadyPaid(invoice.id));
    }

    // Same transaction: a failed discharge takes the settlement down with it.
    let outcome = admission::discharge_in_tx(&tx, &admission_id)?;

    let patient_name = repository::get_patient(&tx, &outcome.patient_id)?
        .map(|p| p.name)
        .unwrap_or_default();
    let doctor_name = match outcome.clinician_id {
        Some(id) => repository::get_clinician(&tx, &id)?.map(|c| c.name),
        None => None,
    };

    tx.commit()?;
    tracing::info!(
        invoice = %invoice.id,
        admission = %admission_id,
        grand_total = totals.grand_total,
        "Invoice settled and admission discharged"
    );

    // Best-effort phase: failures degrade the result, never roll it back.
    let mut warnings = Vec::new();

    if let Some(clinician_id) = outcome.clinician_id {
        match admission::restore_clinician(conn, &clinician_id) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(clinician = %clinician_id, "Clinician still attending, not restored");
            }
            Err(e) => {
                tracing::warn!(clinician = %clinician_id, error = %e, "Clinician restore failed");
                warnings.push(format!(
                    "clinician {clinician_id} availability could not be refreshed: {e}"
                ));
            }
        }
    }

    let body = match &doctor_name {
        Some(doctor) => format!(
            "{patient_name} discharged. Bed {} ({}) freed, {doctor} released.",
            outcome.bed_id, bed.ward
        ),
        None => format!(
            "{patient_name} discharged. Bed {} ({}) freed.",
            outcome.bed_id, bed.ward
        ),
    };
    if let Err(e) = hub.push(NotificationKind::Settlement, "Invoice settled", body) {
        tracing::warn!(error = %e, "Settlement notification could not be delivered");
        warnings.push(format!("notification not delivered: {e}"));
    }

    // Core is committed; the best-effort outcome picks the terminal state.
    let status = if warnings.is_empty() {
        CascadeStatus::BestEffortApplied
    } else {
        CascadeStatus::BestEffortDegraded
    };

    Ok(CascadeResult {
        patient_name,
        bed_id: outcome.bed_id,
        doctor_name,
        status,
        warnings,
    })
}

/// Flip an invoice between pending and paid without touching bed, patient or
/// clinician state.
///
/// This is a manual-correction escape hatch that deliberately bypasses the
/// settlement cascade: toggling a pending invoice for a still-admitted
/// patient produces a paid invoice alongside an occupied bed. The read-view
/// inconsistency report surfaces that state; nothing repairs it
/// automatically. Use `settle_and_discharge` for a real settlement.
pub fn toggle_invoice_status(
    conn: &Connection,
    invoice_id: &Uuid,
) -> Result<InvoiceStatus, LifecycleError> {
    let invoice = repository::get_invoice(conn, invoice_id)?.ok_or(
        LifecycleError::NotFound { entity: "invoice", id: *invoice_id },
    )?;

    let next = match invoice.status {
        InvoiceStatus::Pending => InvoiceStatus::Paid,
        InvoiceStatus::Paid => InvoiceStatus::Pending,
        other => {
            return Err(LifecycleError::Conflict(format!(
                "invoice {} is {}; only pending/paid can be toggled",
                invoice.id,
                other.as_str()
            )))
        }
    };
    repository::set_invoice_status(conn, invoice_id, next)?;
    tracing::info!(
        invoice = %invoice_id,
        from = invoice.status.as_str(),
        to = next.as_str(),
        "Invoice status toggled manually (no cascade)"
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{admit, discharge, AdmitRequest};
    use crate::db::repository::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::{AdmissionStatus, BedStatus, PatientStatus};
    use crate::models::{Clinician, Patient};

    fn admitted_fixture(conn: &mut Connection) -> (Patient, Bed, Clinician, Admission) {
        let patient = Patient::new("Ada Osei", None);
        let bed = Bed::new("general", 180.0);
        let clinician = Clinician::new("Dr. Mensah", None);
        insert_patient(conn, &patient).unwrap();
        insert_bed(conn, &bed).unwrap();
        insert_clinician(conn, &clinician).unwrap();
        let admission = admit(
            conn,
            AdmitRequest {
                patient_id: patient.id,
                clinician_id: Some(clinician.id),
                bed_id: bed.id,
                diagnosis: None,
            },
        )
        .unwrap();
        (patient, bed, clinician, admission)
    }

    fn pending_invoice(conn: &Connection, patient: &Patient, admission: &Admission) -> Invoice {
        let mut invoice = Invoice::new(patient.id, Some(admission.id), 10.0, 0.085);
        invoice.add_line("Treatment package", 1.0, 500.0);
        insert_invoice(conn, &invoice).unwrap();
        invoice
    }

    #[test]
    fn totals_match_worked_example() {
        // 500 in line items, 2 days at 180/day, 10% discount, 8.5% tax
        let patient_id = Uuid::new_v4();
        let bed = Bed::new("general", 180.0);
        let admit_date = chrono::NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let discharge_date = chrono::NaiveDate::from_ymd_opt(2025, 3, 12)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap();
        let admission = Admission {
            id: Uuid::new_v4(),
            patient_id,
            bed_id: bed.id,
            clinician_id: None,
            diagnosis: None,
            admit_date,
            discharge_date: Some(discharge_date),
            status: AdmissionStatus::Discharged,
        };
        let mut invoice = Invoice::new(patient_id, Some(admission.id), 10.0, 0.085);
        invoice.add_line("Treatment package", 1.0, 500.0);

        let totals = compute_totals(&invoice, &admission, &bed, discharge_date);
        assert_eq!(totals.occupied_days, 2);
        assert_eq!(totals.room_charge, 360.0);
        assert_eq!(totals.subtotal, 860.0);
        assert_eq!(totals.discount, 86.0);
        assert_eq!(totals.grand_total, 840.0);
        assert_eq!(totals.tax, 66.0);
    }

    #[test]
    fn settle_and_discharge_frees_everything() {
        let mut conn = open_memory_database().unwrap();
        let hub = NotificationHub::new();
        let (patient, bed, clinician, admission) = admitted_fixture(&mut conn);
        let invoice = pending_invoice(&conn, &patient, &admission);

        let result = settle_and_discharge(
            &mut conn,
            &hub,
            SettleRequest {
                invoice_id: invoice.id,
                payment_method: "card".into(),
                notes: None,
            },
        )
        .unwrap();

        assert_eq!(result.patient_name, "Ada Osei");
        assert_eq!(result.bed_id, bed.id);
        assert_eq!(result.doctor_name.as_deref(), Some("Dr. Mensah"));
        assert_eq!(result.status, CascadeStatus::BestEffortApplied);
        assert!(result.warnings.is_empty());

        let invoice = get_invoice(&conn, &invoice.id).unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.payment_method.as_deref(), Some("card"));
        assert!(invoice.paid_at.is_some());
        assert!(invoice.grand_total.is_some());

        let bed = get_bed(&conn, &bed.id).unwrap().unwrap();
        assert_eq!(bed.status, BedStatus::Empty);
        let patient = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(patient.status, PatientStatus::Discharged);
        let clinician = get_clinician(&conn, &clinician.id).unwrap().unwrap();
        assert_eq!(
            clinician.availability,
            crate::models::enums::ClinicianAvailability::Available
        );

        // Notification describes the freed resources
        let entries = hub.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, NotificationKind::Settlement);
        assert!(entries[0].body.contains("Ada Osei"));
        assert!(entries[0].body.contains("Dr. Mensah"));
    }

    #[test]
    fn settle_already_discharged_admission_leaves_invoice_pending() {
        let mut conn = open_memory_database().unwrap();
        let hub = NotificationHub::new();
        let (patient, _, _, admission) = admitted_fixture(&mut conn);
        let invoice = pending_invoice(&conn, &patient, &admission);

        // Independently discharged before billing gets there
        discharge(&mut conn, &admission.id).unwrap();

        let err = settle_and_discharge(
            &mut conn,
            &hub,
            SettleRequest {
                invoice_id: invoice.id,
                payment_method: "cash".into(),
                notes: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyDischarged(_)), "got: {err}");

        // The settlement rolled back with the failed discharge
        let invoice = get_invoice(&conn, &invoice.id).unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert!(invoice.paid_at.is_none());
        assert!(invoice.grand_total.is_none());
        assert!(hub.entries().is_empty());
    }

    #[test]
    fn settle_paid_invoice_is_already_paid() {
        let mut conn = open_memory_database().unwrap();
        let hub = NotificationHub::new();
        let (patient, _, _, admission) = admitted_fixture(&mut conn);
        let invoice = pending_invoice(&conn, &patient, &admission);

        settle_and_discharge(
            &mut conn,
            &hub,
            SettleRequest {
                invoice_id: invoice.id,
                payment_method: "card".into(),
                notes: None,
            },
        )
        .unwrap();

        let err = settle_and_discharge(
            &mut conn,
            &hub,
            SettleRequest {
                invoice_id: invoice.id,
                payment_method: "card".into(),
                notes: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyPaid(_)), "got: {err}");
    }

    #[test]
    fn settle_unlinked_invoice_is_conflict() {
        let mut conn = open_memory_database().unwrap();
        let hub = NotificationHub::new();
        let patient = Patient::new("Ada Osei", None);
        insert_patient(&conn, &patient).unwrap();
        let invoice = Invoice::new(patient.id, None, 0.0, 0.085);
        insert_invoice(&conn, &invoice).unwrap();

        let err = settle_and_discharge(
            &mut conn,
            &hub,
            SettleRequest {
                invoice_id: invoice.id,
                payment_method: "cash".into(),
                notes: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict(_)), "got: {err}");
    }

    #[test]
    fn settlement_notes_are_recorded() {
        let mut conn = open_memory_database().unwrap();
        let hub = NotificationHub::new();
        let (patient, _, _, admission) = admitted_fixture(&mut conn);
        let invoice = pending_invoice(&conn, &patient, &admission);

        settle_and_discharge(
            &mut conn,
            &hub,
            SettleRequest {
                invoice_id: invoice.id,
                payment_method: "insurance".into(),
                notes: Some("claim #4417".into()),
            },
        )
        .unwrap();

        let invoice = get_invoice(&conn, &invoice.id).unwrap().unwrap();
        assert_eq!(invoice.notes.as_deref(), Some("claim #4417"));
    }

    #[test]
    fn toggle_flips_pending_and_paid() {
        let mut conn = open_memory_database().unwrap();
        let (patient, _, _, admission) = admitted_fixture(&mut conn);
        let invoice = pending_invoice(&conn, &patient, &admission);

        assert_eq!(
            toggle_invoice_status(&conn, &invoice.id).unwrap(),
            InvoiceStatus::Paid
        );
        assert_eq!(
            toggle_invoice_status(&conn, &invoice.id).unwrap(),
            InvoiceStatus::Pending
        );
    }

    #[test]
    fn toggle_bypasses_cascade_entirely() {
        let mut conn = open_memory_database().unwrap();
        let (patient, bed, _, admission) = admitted_fixture(&mut conn);
        let invoice = pending_invoice(&conn, &patient, &admission);

        toggle_invoice_status(&conn, &invoice.id).unwrap();

        // Paid invoice, yet the patient is still admitted and the bed held
        let invoice = get_invoice(&conn, &invoice.id).unwrap().unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        let bed = get_bed(&conn, &bed.id).unwrap().unwrap();
        assert_eq!(bed.status, BedStatus::Occupied);
        let loaded = get_admission(&conn, &admission.id).unwrap().unwrap();
        assert_eq!(loaded.status, AdmissionStatus::Active);
    }

    #[test]
    fn toggle_refuses_waived_invoice() {
        let mut conn = open_memory_database().unwrap();
        let (patient, _, _, admission) = admitted_fixture(&mut conn);
        let invoice = pending_invoice(&conn, &patient, &admission);
        set_invoice_status(&conn, &invoice.id, InvoiceStatus::Waived).unwrap();

        let err = toggle_invoice_status(&conn, &invoice.id).unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict(_)), "got: {err}");
    }
}
