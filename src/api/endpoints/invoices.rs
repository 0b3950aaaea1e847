//! Billing endpoints.
//!
//! - `POST /api/invoices/:id/settle` — settle the invoice and discharge its
//!   linked admission (the full cascade)
//! - `POST /api/invoices/:id/toggle-status` — manual pending↔paid flip that
//!   bypasses the cascade entirely

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::billing::{self, CascadeResult, CascadeStatus, SettleRequest};

#[derive(Deserialize)]
pub struct SettleBody {
    pub payment_method: String,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct SettleResponse {
    pub result: CascadeResult,
    /// "ok" when the best-effort phase fully applied, "degraded" otherwise.
    pub status: &'static str,
}

/// `POST /api/invoices/:id/settle` — settle and discharge.
///
/// Returns 200 with `status: "degraded"` when the core committed but a
/// best-effort follow-up (clinician restore, notification) failed — the UI
/// should prompt a manual check rather than a retry.
pub async fn settle(
    State(ctx): State<ApiContext>,
    Path(invoice_id): Path<String>,
    Json(body): Json<SettleBody>,
) -> Result<Json<SettleResponse>, ApiError> {
    let invoice_id = Uuid::parse_str(&invoice_id)
        .map_err(|_| ApiError::BadRequest("Invalid invoice id".into()))?;

    let mut conn = ctx.core.open_db()?;
    let result = billing::settle_and_discharge(
        &mut conn,
        &ctx.core.notifications,
        SettleRequest {
            invoice_id,
            payment_method: body.payment_method,
            notes: body.notes,
        },
    )
    .map_err(ApiError::from)?;

    let status = match result.status {
        CascadeStatus::BestEffortDegraded => "degraded",
        _ => "ok",
    };
    Ok(Json(SettleResponse { result, status }))
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub invoice_id: Uuid,
    pub status: String,
}

/// `POST /api/invoices/:id/toggle-status` — manual correction.
///
/// Bypasses the cascade: bed, patient and clinician are untouched, so this
/// can produce a paid invoice for a still-admitted patient. That state shows
/// up in `GET /api/inconsistencies`; it is an accepted escape hatch for
/// manual billing correction, not a replacement for discharge.
pub async fn toggle_status(
    State(ctx): State<ApiContext>,
    Path(invoice_id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let invoice_id = Uuid::parse_str(&invoice_id)
        .map_err(|_| ApiError::BadRequest("Invalid invoice id".into()))?;

    let conn = ctx.core.open_db()?;
    let status = billing::toggle_invoice_status(&conn, &invoice_id).map_err(ApiError::from)?;

    Ok(Json(ToggleResponse {
        invoice_id,
        status: status.as_str().to_string(),
    }))
}
