use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    certificate::{self, CertificateOffer},
    client::{ClientError, MitxOnlineClient},
    config::AppConfig,
    dashboard,
    dialog::{DialogError, EnrollmentAction, EnrollmentDialog},
    eligibility,
    models::*,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: MitxOnlineClient,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // pure decisions over caller-supplied records
        .route("/api/enrollment-options", post(enrollment_options))
        .route("/api/certificate", post(certificate_offer))
        .route("/api/dashboard", post(dashboard_sorted).get(dashboard_upstream))
        // upstream-backed
        .route("/api/courses/:course_id/enrollment-options", get(course_enrollment_options))
        .route("/api/enrollments/confirm", post(confirm_enrollment))
        .with_state(state)
}

pub fn build_options(course: &Course) -> EnrollmentOptions {
    let eligible = eligibility::eligible_runs(course);
    let runs = eligible
        .iter()
        .map(|r| RunOption {
            id: r.id,
            label: certificate::run_label(r),
            certificate: certificate::resolve(r),
        })
        .collect();
    EnrollmentOptions {
        runs,
        default_run_id: eligibility::default_selection(&eligible),
        best_run_id: eligibility::best_run(course).map(|r| r.id),
        price_range: certificate::price_range(course),
    }
}

fn build_dashboard(records: &[EnrollmentRecord], now: chrono::DateTime<Utc>) -> DashboardResp {
    let mapped = records.iter().map(dashboard::to_view_model).collect();
    DashboardResp { enrollments: dashboard::sort_enrollments(mapped, now) }
}

async fn enrollment_options(Json(course): Json<Course>) -> Json<EnrollmentOptions> {
    Json(build_options(&course))
}

async fn certificate_offer(Json(run): Json<CourseRun>) -> Json<CertificateOffer> {
    Json(certificate::resolve(&run))
}

async fn dashboard_sorted(Json(req): Json<DashboardReq>) -> Json<DashboardResp> {
    let now = req.now.unwrap_or_else(Utc::now);
    Json(build_dashboard(&req.enrollments, now))
}

async fn dashboard_upstream(
    State(st): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardResp>, (StatusCode, String)> {
    let records = st.client.enrollments(cookie(&headers)).await.map_err(e502)?;
    Ok(Json(build_dashboard(&records, Utc::now())))
}

async fn course_enrollment_options(
    State(st): State<AppState>,
    Path(course_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<EnrollmentOptions>, (StatusCode, String)> {
    let course = st.client.course(course_id, cookie(&headers)).await.map_err(e502)?;
    Ok(Json(build_options(&course)))
}

async fn confirm_enrollment(
    State(st): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ConfirmEnrollmentReq>,
) -> Result<Json<EnrollmentAction>, (StatusCode, String)> {
    let mut dialog = EnrollmentDialog::new();
    dialog.open(&req.course);
    if let Some(run_id) = req.run_id {
        dialog.select(run_id).map_err(e400)?;
    }
    let action = dialog
        .confirm(req.track, &req.course, &st.config.cart_url)
        .map_err(e400)?;

    if let EnrollmentAction::CreateEnrollment { run_id } = &action {
        st.client
            .create_enrollment(*run_id, cookie(&headers))
            .await
            .map_err(e502)?;
    }
    Ok(Json(action))
}

// --- helpers ---
fn cookie(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::COOKIE).and_then(|v| v.to_str().ok())
}

fn e400(e: DialogError) -> (StatusCode, String) {
    tracing::info!(error = %e, "enrollment rejected");
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn e502(e: ClientError) -> (StatusCode, String) {
    tracing::error!(error = %e, "upstream error");
    (StatusCode::BAD_GATEWAY, e.to_string())
}
