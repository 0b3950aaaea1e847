//! Read views — composed joins for display.
//!
//! Pure read side: every query here runs against committed state only (the
//! coordinator's units are transactions, so there is no mid-cascade state to
//! observe). Includes the inconsistency report that surfaces what the manual
//! invoice toggle can produce.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::DatabaseError;

/// One row of the admission board: admission ⋈ patient ⋈ bed ⋈ clinician.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionView {
    pub admission_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub bed_id: Uuid,
    pub ward: String,
    pub clinician_name: Option<String>,
    pub diagnosis: Option<String>,
    pub admit_date: NaiveDateTime,
    pub discharge_date: Option<NaiveDateTime>,
    pub status: String,
}

/// One row of the invoice list: invoice ⋈ patient.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    pub invoice_id: Uuid,
    pub patient_name: String,
    pub admission_id: Option<Uuid>,
    pub status: String,
    pub grand_total: Option<f64>,
    pub paid_at: Option<NaiveDateTime>,
}

/// A cross-entity state the coordinator would never produce on its own.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    /// Paid invoice whose linked admission is still active — the documented
    /// outcome of the manual invoice toggle bypassing the cascade.
    PaidInvoiceActiveAdmission { invoice_id: Uuid, admission_id: Uuid },
    /// Bed marked occupied with no active admission referencing it.
    OccupiedBedWithoutAdmission { bed_id: Uuid },
    /// Active admission over a bed that is not marked occupied.
    ActiveAdmissionBedNotOccupied { admission_id: Uuid, bed_id: Uuid },
}

fn parse_uuid(s: String) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(&s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

fn parse_dt(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp '{s}': {e}")))
}

/// The admission board. `active_only` limits it to current stays; otherwise
/// the full admit/discharge history is returned, newest first.
pub fn admission_board(
    conn: &Connection,
    active_only: bool,
) -> Result<Vec<AdmissionView>, DatabaseError> {
    let sql = format!(
        "SELECT a.id, a.patient_id, p.name, a.bed_id, b.ward, c.name, a.diagnosis,
                a.admit_date, a.discharge_date, a.status
         FROM admissions a
         JOIN patients p ON p.id = a.patient_id
         JOIN beds b ON b.id = a.bed_id
         LEFT JOIN clinicians c ON c.id = a.clinician_id
         {}
         ORDER BY a.admit_date DESC",
        if active_only { "WHERE a.status = 'active'" } else { "" }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, Option<String>>(8)?,
            row.get::<_, String>(9)?,
        ))
    })?;

    let mut views = Vec::new();
    for row in rows {
        let (id, patient_id, patient_name, bed_id, ward, clinician_name, diagnosis, admit, disch, status) =
            row?;
        views.push(AdmissionView {
            admission_id: parse_uuid(id)?,
            patient_id: parse_uuid(patient_id)?,
            patient_name,
            bed_id: parse_uuid(bed_id)?,
            ward,
            clinician_name,
            diagnosis,
            admit_date: parse_dt(&admit)?,
            discharge_date: disch.as_deref().map(parse_dt).transpose()?,
            status,
        });
    }
    Ok(views)
}

/// Invoice list for display, newest settlement first, open invoices on top.
pub fn invoice_list(conn: &Connection) -> Result<Vec<InvoiceView>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT i.id, p.name, i.admission_id, i.status, i.grand_total, i.paid_at
         FROM invoices i
         JOIN patients p ON p.id = i.patient_id
         ORDER BY i.paid_at IS NOT NULL, i.paid_at DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<f64>>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut views = Vec::new();
    for row in rows {
        let (id, patient_name, admission_id, status, grand_total, paid_at) = row?;
        views.push(InvoiceView {
            invoice_id: parse_uuid(id)?,
            patient_name,
            admission_id: admission_id.map(parse_uuid).transpose()?,
            status,
            grand_total,
            paid_at: paid_at.as_deref().map(parse_dt).transpose()?,
        });
    }
    Ok(views)
}

/// Scan for cross-entity states the coordinator's invariants forbid.
///
/// These can only appear through paths that bypass the cascade (the manual
/// invoice toggle, ward staff flipping an occupied bed). They are reported,
/// never silently repaired.
pub fn find_inconsistencies(conn: &Connection) -> Result<Vec<Inconsistency>, DatabaseError> {
    let mut found = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT i.id, a.id FROM invoices i
         JOIN admissions a ON a.id = i.admission_id
         WHERE i.status = 'paid' AND a.status = 'active'",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (invoice_id, admission_id) = row?;
        found.push(Inconsistency::PaidInvoiceActiveAdmission {
            invoice_id: parse_uuid(invoice_id)?,
            admission_id: parse_uuid(admission_id)?,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT b.id FROM beds b
         WHERE b.status = 'occupied'
           AND NOT EXISTS (SELECT 1 FROM admissions a
                           WHERE a.bed_id = b.id AND a.status = 'active')",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    for row in rows {
        found.push(Inconsistency::OccupiedBedWithoutAdmission {
            bed_id: parse_uuid(row?)?,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT a.id, a.bed_id FROM admissions a
         JOIN beds b ON b.id = a.bed_id
         WHERE a.status = 'active' AND b.status != 'occupied'",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (admission_id, bed_id) = row?;
        found.push(Inconsistency::ActiveAdmissionBedNotOccupied {
            admission_id: parse_uuid(admission_id)?,
            bed_id: parse_uuid(bed_id)?,
        });
    }

    Ok(found)
}
