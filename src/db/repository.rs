use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_dt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FORMAT).to_string()
}

fn parse_dt(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, DT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp '{s}': {e}")))
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

// ═══════════════════════════════════════════
// Patient Repository
// ═══════════════════════════════════════════

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, contact, status) VALUES (?1, ?2, ?3, ?4)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.contact,
            patient.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, name, contact, status FROM patients WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((id, name, contact, status)) => Ok(Some(Patient {
            id: parse_uuid(&id)?,
            name,
            contact,
            status: PatientStatus::from_str(&status)?,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_patient_status(
    conn: &Connection,
    id: &Uuid,
    status: PatientStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Bed Repository
// ═══════════════════════════════════════════

pub fn insert_bed(conn: &Connection, bed: &Bed) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO beds (id, ward, daily_rate, status) VALUES (?1, ?2, ?3, ?4)",
        params![
            bed.id.to_string(),
            bed.ward,
            bed.daily_rate,
            bed.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_bed(conn: &Connection, id: &Uuid) -> Result<Option<Bed>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, ward, daily_rate, status FROM beds WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((id, ward, daily_rate, status)) => Ok(Some(Bed {
            id: parse_uuid(&id)?,
            ward,
            daily_rate,
            status: BedStatus::from_str(&status)?,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Compare-and-set: empty → occupied. Returns false when the bed was not
/// empty (someone else claimed it, or it is reserved/under maintenance),
/// so the caller can surface a conflict instead of double-booking.
pub fn claim_bed(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE beds SET status = 'occupied' WHERE id = ?1 AND status = 'empty'",
        params![id.to_string()],
    )?;
    Ok(changed == 1)
}

/// Compare-and-set: occupied → empty. Returns false when the bed was not
/// occupied — a sign the admission being discharged no longer holds it.
pub fn release_bed(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE beds SET status = 'empty' WHERE id = ?1 AND status = 'occupied'",
        params![id.to_string()],
    )?;
    Ok(changed == 1)
}

/// Ward-staff path: reserved/maintenance flips, outside any cascade.
pub fn set_bed_status(conn: &Connection, id: &Uuid, status: BedStatus) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE beds SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "bed".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Clinician Repository
// ═══════════════════════════════════════════

pub fn insert_clinician(conn: &Connection, clinician: &Clinician) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinicians (id, name, specialty, availability) VALUES (?1, ?2, ?3, ?4)",
        params![
            clinician.id.to_string(),
            clinician.name,
            clinician.specialty,
            clinician.availability.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_clinician(conn: &Connection, id: &Uuid) -> Result<Option<Clinician>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, name, specialty, availability FROM clinicians WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((id, name, specialty, availability)) => Ok(Some(Clinician {
            id: parse_uuid(&id)?,
            name,
            specialty,
            availability: ClinicianAvailability::from_str(&availability)?,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_clinician_availability(
    conn: &Connection,
    id: &Uuid,
    availability: ClinicianAvailability,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE clinicians SET availability = ?2 WHERE id = ?1",
        params![id.to_string(), availability.as_str()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "clinician".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// How many active admissions name this clinician as attending.
/// Discharge only restores availability when this drops to zero.
pub fn clinician_active_admissions(conn: &Connection, id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM admissions WHERE clinician_id = ?1 AND status = 'active'",
        params![id.to_string()],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

// ═══════════════════════════════════════════
// Admission Repository
// ═══════════════════════════════════════════

pub fn insert_admission(conn: &Connection, admission: &Admission) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO admissions (id, patient_id, bed_id, clinician_id, diagnosis,
         admit_date, discharge_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            admission.id.to_string(),
            admission.patient_id.to_string(),
            admission.bed_id.to_string(),
            admission.clinician_id.map(|id| id.to_string()),
            admission.diagnosis,
            format_dt(&admission.admit_date),
            admission.discharge_date.as_ref().map(format_dt),
            admission.status.as_str(),
        ],
    )?;
    Ok(())
}

// Internal row type for Admission mapping
struct AdmissionRow {
    id: String,
    patient_id: String,
    bed_id: String,
    clinician_id: Option<String>,
    diagnosis: Option<String>,
    admit_date: String,
    discharge_date: Option<String>,
    status: String,
}

fn admission_from_row(row: AdmissionRow) -> Result<Admission, DatabaseError> {
    Ok(Admission {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        bed_id: parse_uuid(&row.bed_id)?,
        clinician_id: row.clinician_id.as_deref().map(parse_uuid).transpose()?,
        diagnosis: row.diagnosis,
        admit_date: parse_dt(&row.admit_date)?,
        discharge_date: row.discharge_date.as_deref().map(parse_dt).transpose()?,
        status: AdmissionStatus::from_str(&row.status)?,
    })
}

pub fn get_admission(conn: &Connection, id: &Uuid) -> Result<Option<Admission>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, patient_id, bed_id, clinician_id, diagnosis, admit_date, discharge_date, status
         FROM admissions WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(AdmissionRow {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                bed_id: row.get(2)?,
                clinician_id: row.get(3)?,
                diagnosis: row.get(4)?,
                admit_date: row.get(5)?,
                discharge_date: row.get(6)?,
                status: row.get(7)?,
            })
        },
    );

    match result {
        Ok(row) => Ok(Some(admission_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The active admission holding a given bed, if any.
pub fn active_admission_for_bed(
    conn: &Connection,
    bed_id: &Uuid,
) -> Result<Option<Admission>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, patient_id, bed_id, clinician_id, diagnosis, admit_date, discharge_date, status
         FROM admissions WHERE bed_id = ?1 AND status = 'active'",
        params![bed_id.to_string()],
        |row| {
            Ok(AdmissionRow {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                bed_id: row.get(2)?,
                clinician_id: row.get(3)?,
                diagnosis: row.get(4)?,
                admit_date: row.get(5)?,
                discharge_date: row.get(6)?,
                status: row.get(7)?,
            })
        },
    );

    match result {
        Ok(row) => Ok(Some(admission_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The active admission for a given patient, if any.
pub fn active_admission_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Option<Admission>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, patient_id, bed_id, clinician_id, diagnosis, admit_date, discharge_date, status
         FROM admissions WHERE patient_id = ?1 AND status = 'active'",
        params![patient_id.to_string()],
        |row| {
            Ok(AdmissionRow {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                bed_id: row.get(2)?,
                clinician_id: row.get(3)?,
                diagnosis: row.get(4)?,
                admit_date: row.get(5)?,
                discharge_date: row.get(6)?,
                status: row.get(7)?,
            })
        },
    );

    match result {
        Ok(row) => Ok(Some(admission_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Compare-and-set: active → discharged, stamping the discharge date.
/// Returns false when the admission was already closed, so a second
/// discharge fails loudly instead of double-freeing the bed.
pub fn close_admission(
    conn: &Connection,
    id: &Uuid,
    discharged_at: &NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE admissions SET status = 'discharged', discharge_date = ?2
         WHERE id = ?1 AND status = 'active'",
        params![id.to_string(), format_dt(discharged_at)],
    )?;
    Ok(changed == 1)
}

// ═══════════════════════════════════════════
// Invoice Repository
// ═══════════════════════════════════════════

pub fn insert_invoice(conn: &Connection, invoice: &Invoice) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO invoices (id, patient_id, admission_id, discount_pct, tax_rate,
         subtotal, tax, grand_total, status, payment_method, paid_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            invoice.id.to_string(),
            invoice.patient_id.to_string(),
            invoice.admission_id.map(|id| id.to_string()),
            invoice.discount_pct,
            invoice.tax_rate,
            invoice.subtotal,
            invoice.tax,
            invoice.grand_total,
            invoice.status.as_str(),
            invoice.payment_method,
            invoice.paid_at.as_ref().map(format_dt),
            invoice.notes,
        ],
    )?;

    for (position, item) in invoice.line_items.iter().enumerate() {
        conn.execute(
            "INSERT INTO invoice_items (id, invoice_id, position, label, qty, unit_rate, amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.id.to_string(),
                invoice.id.to_string(),
                position as i64,
                item.label,
                item.qty,
                item.unit_rate,
                item.amount,
            ],
        )?;
    }
    Ok(())
}

// Internal row type for Invoice mapping
struct InvoiceRow {
    id: String,
    patient_id: String,
    admission_id: Option<String>,
    discount_pct: f64,
    tax_rate: f64,
    subtotal: Option<f64>,
    tax: Option<f64>,
    grand_total: Option<f64>,
    status: String,
    payment_method: Option<String>,
    paid_at: Option<String>,
    notes: Option<String>,
}

fn invoice_from_row(row: InvoiceRow, line_items: Vec<LineItem>) -> Result<Invoice, DatabaseError> {
    Ok(Invoice {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        admission_id: row.admission_id.as_deref().map(parse_uuid).transpose()?,
        line_items,
        discount_pct: row.discount_pct,
        tax_rate: row.tax_rate,
        subtotal: row.subtotal,
        tax: row.tax,
        grand_total: row.grand_total,
        status: InvoiceStatus::from_str(&row.status)?,
        payment_method: row.payment_method,
        paid_at: row.paid_at.as_deref().map(parse_dt).transpose()?,
        notes: row.notes,
    })
}

fn get_invoice_items(conn: &Connection, invoice_id: &Uuid) -> Result<Vec<LineItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, label, qty, unit_rate, amount FROM invoice_items
         WHERE invoice_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![invoice_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, f64>(4)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (id, label, qty, unit_rate, amount) = row?;
        items.push(LineItem {
            id: parse_uuid(&id)?,
            label,
            qty,
            unit_rate,
            amount,
        });
    }
    Ok(items)
}

pub fn get_invoice(conn: &Connection, id: &Uuid) -> Result<Option<Invoice>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, patient_id, admission_id, discount_pct, tax_rate, subtotal, tax,
         grand_total, status, payment_method, paid_at, notes
         FROM invoices WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(InvoiceRow {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                admission_id: row.get(2)?,
                discount_pct: row.get(3)?,
                tax_rate: row.get(4)?,
                subtotal: row.get(5)?,
                tax: row.get(6)?,
                grand_total: row.get(7)?,
                status: row.get(8)?,
                payment_method: row.get(9)?,
                paid_at: row.get(10)?,
                notes: row.get(11)?,
            })
        },
    );

    match result {
        Ok(row) => {
            let items = get_invoice_items(conn, &parse_uuid(&row.id)?)?;
            Ok(Some(invoice_from_row(row, items)?))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Compare-and-set: pending → paid, freezing the computed totals onto the
/// row. Returns false when the invoice was not pending.
#[allow(clippy::too_many_arguments)]
pub fn settle_invoice(
    conn: &Connection,
    id: &Uuid,
    subtotal: f64,
    tax: f64,
    grand_total: f64,
    payment_method: &str,
    paid_at: &NaiveDateTime,
    notes: Option<&str>,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE invoices SET status = 'paid', subtotal = ?2, tax = ?3, grand_total = ?4,
         payment_method = ?5, paid_at = ?6, notes = COALESCE(?7, notes)
         WHERE id = ?1 AND status = 'pending'",
        params![
            id.to_string(),
            subtotal,
            tax,
            grand_total,
            payment_method,
            format_dt(paid_at),
            notes,
        ],
    )?;
    Ok(changed == 1)
}

/// Manual correction path: pending ↔ paid without any cascade.
pub fn set_invoice_status(
    conn: &Connection,
    id: &Uuid,
    status: InvoiceStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE invoices SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "invoice".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
