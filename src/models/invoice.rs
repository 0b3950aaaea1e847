use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::InvoiceStatus;

/// A billing invoice, optionally linked to one admission. Totals columns are
/// NULL until settlement freezes them; status only ever moves
/// pending → {paid, waived} (partial is reserved for manual bookkeeping).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub admission_id: Option<Uuid>,
    pub line_items: Vec<LineItem>,
    pub discount_pct: f64,
    pub tax_rate: f64,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub grand_total: Option<f64>,
    pub status: InvoiceStatus,
    pub payment_method: Option<String>,
    pub paid_at: Option<NaiveDateTime>,
    pub notes: Option<String>,
}

/// One ordered invoice line: `amount` is stored rather than derived so that
/// manually corrected lines survive re-reads unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Uuid,
    pub label: String,
    pub qty: f64,
    pub unit_rate: f64,
    pub amount: f64,
}

impl Invoice {
    pub fn new(patient_id: Uuid, admission_id: Option<Uuid>, discount_pct: f64, tax_rate: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            admission_id,
            line_items: Vec::new(),
            discount_pct,
            tax_rate,
            subtotal: None,
            tax: None,
            grand_total: None,
            status: InvoiceStatus::Pending,
            payment_method: None,
            paid_at: None,
            notes: None,
        }
    }

    pub fn add_line(&mut self, label: impl Into<String>, qty: f64, unit_rate: f64) -> &mut Self {
        self.line_items.push(LineItem {
            id: Uuid::new_v4(),
            label: label.into(),
            qty,
            unit_rate,
            amount: qty * unit_rate,
        });
        self
    }

    /// Sum of the stored line amounts, before any room charge.
    pub fn items_total(&self) -> f64 {
        self.line_items.iter().map(|l| l.amount).sum()
    }
}
