//! Read-view endpoints. No side effects.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::views::{self, AdmissionView, Inconsistency, InvoiceView};

#[derive(Deserialize)]
pub struct BoardParams {
    /// Include discharged stays as well. Defaults to active-only.
    #[serde(default)]
    pub include_history: bool,
}

#[derive(Serialize)]
pub struct BoardResponse {
    pub admissions: Vec<AdmissionView>,
}

/// `GET /api/admissions` — the admission board.
pub async fn board(
    State(ctx): State<ApiContext>,
    Query(params): Query<BoardParams>,
) -> Result<Json<BoardResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let admissions = views::admission_board(&conn, !params.include_history)?;
    Ok(Json(BoardResponse { admissions }))
}

#[derive(Serialize)]
pub struct InvoicesResponse {
    pub invoices: Vec<InvoiceView>,
}

/// `GET /api/invoices` — invoice list with patient names.
pub async fn invoices(State(ctx): State<ApiContext>) -> Result<Json<InvoicesResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let invoices = views::invoice_list(&conn)?;
    Ok(Json(InvoicesResponse { invoices }))
}

#[derive(Serialize)]
pub struct InconsistenciesResponse {
    pub inconsistencies: Vec<Inconsistency>,
}

/// `GET /api/inconsistencies` — cross-entity states the coordinator forbids,
/// produced only by cascade-bypassing paths. Reported, never auto-repaired.
pub async fn inconsistencies(
    State(ctx): State<ApiContext>,
) -> Result<Json<InconsistenciesResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let inconsistencies = views::find_inconsistencies(&conn)?;
    Ok(Json(InconsistenciesResponse { inconsistencies }))
}
