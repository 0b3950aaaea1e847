//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`. No auth middleware lives here —
//! session issuance is a front-proxy concern, outside this service.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the lifecycle API router.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/admissions", get(endpoints::views::board))
        .route("/admissions", post(endpoints::admissions::admit))
        .route(
            "/admissions/:id/discharge",
            post(endpoints::admissions::discharge),
        )
        .route("/invoices", get(endpoints::views::invoices))
        .route("/invoices/:id/settle", post(endpoints::invoices::settle))
        .route(
            "/invoices/:id/toggle-status",
            post(endpoints::invoices::toggle_status),
        )
        .route("/inconsistencies", get(endpoints::views::inconsistencies))
        .route("/notifications", get(endpoints::notifications::list))
        .route("/notifications/read", post(endpoints::notifications::mark_read))
        .with_state(ctx);

    Router::new().nest("/api", routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use crate::db::repository::*;
    use crate::models::{Bed, Clinician, Invoice, Patient};

    struct TestApp {
        router: Router,
        core: Arc<CoreState>,
        _dir: tempfile::TempDir,
    }

    fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::new(dir.path().join("test.db")));
        TestApp {
            router: api_router(core.clone()),
            core,
            _dir: dir,
        }
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn seed(app: &TestApp) -> (Patient, Bed, Clinician) {
        let conn = app.core.open_db().unwrap();
        let patient = Patient::new("Ada Osei", None);
        let bed = Bed::new("general", 180.0);
        let clinician = Clinician::new("Dr. Mensah", None);
        insert_patient(&conn, &patient).unwrap();
        insert_bed(&conn, &bed).unwrap();
        insert_clinician(&conn, &clinician).unwrap();
        (patient, bed, clinician)
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = test_app();
        let (status, body) = send(&app.router, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn admit_then_discharge_over_http() {
        let app = test_app();
        let (patient, bed, clinician) = seed(&app);

        let (status, body) = send(
            &app.router,
            "POST",
            "/api/admissions",
            Some(json!({
                "patient_id": patient.id,
                "clinician_id": clinician.id,
                "bed_id": bed.id,
                "diagnosis": "observation",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let admission_id = body["admission"]["id"].as_str().unwrap().to_string();

        // Board shows the stay
        let (status, body) = send(&app.router, "GET", "/api/admissions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["admissions"].as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app.router,
            "POST",
            &format!("/api/admissions/{admission_id}/discharge"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["freed"]["bed_id"], json!(bed.id));

        // Second discharge fails loudly
        let (status, body) = send(
            &app.router,
            "POST",
            &format!("/api/admissions/{admission_id}/discharge"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "ALREADY_DISCHARGED");
    }

    #[tokio::test]
    async fn admit_conflict_maps_to_409() {
        let app = test_app();
        let (patient, bed, _) = seed(&app);
        let second = {
            let conn = app.core.open_db().unwrap();
            let p = Patient::new("Kofi Boateng", None);
            insert_patient(&conn, &p).unwrap();
            p
        };

        let admit = |p: &Patient| {
            json!({ "patient_id": p.id, "clinician_id": null, "bed_id": bed.id, "diagnosis": null })
        };
        let (status, _) = send(&app.router, "POST", "/api/admissions", Some(admit(&patient))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(&app.router, "POST", "/api/admissions", Some(admit(&second))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn admit_unknown_bed_is_404() {
        let app = test_app();
        let (patient, _, _) = seed(&app);

        let (status, body) = send(
            &app.router,
            "POST",
            "/api/admissions",
            Some(json!({
                "patient_id": patient.id,
                "clinician_id": null,
                "bed_id": uuid::Uuid::new_v4(),
                "diagnosis": null,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn settle_cascade_over_http() {
        let app = test_app();
        let (patient, _, clinician) = seed(&app);
        let conn = app.core.open_db().unwrap();
        let bed = Bed::new("general", 180.0);
        insert_bed(&conn, &bed).unwrap();
        drop(conn);

        let (status, body) = send(
            &app.router,
            "POST",
            "/api/admissions",
            Some(json!({
                "patient_id": patient.id,
                "clinician_id": clinician.id,
                "bed_id": bed.id,
                "diagnosis": null,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let admission_id = body["admission"]["id"].as_str().unwrap().to_string();

        let invoice = {
            let conn = app.core.open_db().unwrap();
            let mut invoice = Invoice::new(
                patient.id,
                Some(uuid::Uuid::parse_str(&admission_id).unwrap()),
                10.0,
                0.085,
            );
            invoice.add_line("Treatment package", 1.0, 500.0);
            insert_invoice(&conn, &invoice).unwrap();
            invoice
        };

        let (status, body) = send(
            &app.router,
            "POST",
            &format!("/api/invoices/{}/settle", invoice.id),
            Some(json!({ "payment_method": "card", "notes": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["result"]["patient_name"], "Ada Osei");
        assert_eq!(body["result"]["doctor_name"], "Dr. Mensah");

        // Settling again: already paid
        let (status, body) = send(
            &app.router,
            "POST",
            &format!("/api/invoices/{}/settle", invoice.id),
            Some(json!({ "payment_method": "card", "notes": null })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "ALREADY_PAID");

        // The cascade pushed a settlement notification
        let (status, body) = send(&app.router, "GET", "/api/notifications", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["unread"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn toggle_produces_flagged_inconsistency() {
        let app = test_app();
        let (patient, bed, _) = seed(&app);

        let (status, body) = send(
            &app.router,
            "POST",
            "/api/admissions",
            Some(json!({
                "patient_id": patient.id,
                "clinician_id": null,
                "bed_id": bed.id,
                "diagnosis": null,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let admission_id = body["admission"]["id"].as_str().unwrap().to_string();

        let invoice = {
            let conn = app.core.open_db().unwrap();
            let invoice = Invoice::new(
                patient.id,
                Some(uuid::Uuid::parse_str(&admission_id).unwrap()),
                0.0,
                0.085,
            );
            insert_invoice(&conn, &invoice).unwrap();
            invoice
        };

        let (status, body) = send(
            &app.router,
            "POST",
            &format!("/api/invoices/{}/toggle-status", invoice.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "paid");

        let (status, body) = send(&app.router, "GET", "/api/inconsistencies", None).await;
        assert_eq!(status, StatusCode::OK);
        let found = body["inconsistencies"].as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["kind"], "paid_invoice_active_admission");
    }

    #[tokio::test]
    async fn invalid_uuid_is_bad_request() {
        let app = test_app();
        let (status, body) = send(
            &app.router,
            "POST",
            "/api/admissions/not-a-uuid/discharge",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn mark_read_clears_unread() {
        let app = test_app();
        app.core
            .notifications
            .push(crate::models::enums::NotificationKind::Alert, "x", "")
            .unwrap();

        let (status, body) = send(&app.router, "POST", "/api/notifications/read", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unread"], 0);
    }
}
