//! Admission lifecycle endpoints.
//!
//! Two commands:
//! - `POST /api/admissions` — admit a patient to a bed
//! - `POST /api/admissions/:id/discharge` — close the stay and free resources

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::admission::{self, AdmitRequest, DischargeOutcome};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::enums::NotificationKind;
use crate::models::Admission;

#[derive(Serialize)]
pub struct AdmitResponse {
    pub admission: Admission,
}

/// `POST /api/admissions` — admit a patient.
///
/// The admission row, the bed flip and the patient status commit as one
/// unit; a conflict (bed taken, patient already admitted) leaves nothing.
pub async fn admit(
    State(ctx): State<ApiContext>,
    Json(req): Json<AdmitRequest>,
) -> Result<(StatusCode, Json<AdmitResponse>), ApiError> {
    let mut conn = ctx.core.open_db()?;
    let admission = admission::admit(&mut conn, req).map_err(ApiError::from)?;

    if let Err(e) = ctx.core.notifications.push(
        NotificationKind::Admission,
        "Patient admitted",
        format!("Admission {} opened on bed {}", admission.id, admission.bed_id),
    ) {
        tracing::warn!(error = %e, "Admission notification could not be delivered");
    }

    Ok((StatusCode::CREATED, Json(AdmitResponse { admission })))
}

#[derive(Serialize)]
pub struct DischargeResponse {
    pub freed: DischargeOutcome,
    /// "ok" when every follow-up applied, "degraded" otherwise.
    pub status: &'static str,
    pub warnings: Vec<String>,
}

/// `POST /api/admissions/:id/discharge` — discharge an admission.
///
/// The atomic core closes the admission, frees the bed and marks the patient
/// discharged. Afterwards the clinician restore and the notification run
/// best-effort: their failure degrades the response but never rolls the
/// discharge back.
pub async fn discharge(
    State(ctx): State<ApiContext>,
    Path(admission_id): Path<String>,
) -> Result<Json<DischargeResponse>, ApiError> {
    let admission_id = Uuid::parse_str(&admission_id)
        .map_err(|_| ApiError::BadRequest("Invalid admission id".into()))?;

    let mut conn = ctx.core.open_db()?;
    let freed = admission::discharge(&mut conn, &admission_id).map_err(ApiError::from)?;

    let mut warnings = Vec::new();
    if let Some(clinician_id) = freed.clinician_id {
        if let Err(e) = admission::restore_clinician(&conn, &clinician_id) {
            tracing::warn!(clinician = %clinician_id, error = %e, "Clinician restore failed");
            warnings.push(format!(
                "clinician {clinician_id} availability could not be refreshed: {e}"
            ));
        }
    }
    if let Err(e) = ctx.core.notifications.push(
        NotificationKind::Discharge,
        "Patient discharged",
        format!("Bed {} freed by admission {}", freed.bed_id, admission_id),
    ) {
        tracing::warn!(error = %e, "Discharge notification could not be delivered");
        warnings.push(format!("notification not delivered: {e}"));
    }

    let status = if warnings.is_empty() { "ok" } else { "degraded" };
    Ok(Json(DischargeResponse { freed, status, warnings }))
}
