use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    middlewares::auth::JwtClaims,
    models::certificate::IssueCertificateRequest,
    services::{
        certificate_service::{CertificateError, CertificateService},
        AppState,
    },
};

fn certificate_service(state: &AppState) -> CertificateService {
    CertificateService::new(
        state.mongo.clone(),
        state.storage.clone(),
        state.config.storage.template_key.clone(),
    )
}

/// Renders and stores a certificate for the authenticated learner.
///
/// The caller confirms the learner passed the course quiz before offering
/// this; the text fields arrive already reviewed by the learner.
pub async fn issue_certificate(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Json(req): Json<IssueCertificateRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(errors) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, errors.to_string()));
    }

    tracing::info!(
        "Issuing certificate for user {} course {}",
        claims.sub,
        req.course_id
    );

    match certificate_service(&state).generate(&claims.sub, &req).await {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(err) => {
            tracing::error!("Certificate generation failed: {:?}", err);
            let status = match err {
                CertificateError::TemplateUnavailable(_)
                | CertificateError::StorageUploadFailed(_) => StatusCode::BAD_GATEWAY,
                CertificateError::RecordPersistFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            // The quiz pass persists independently of this failure.
            Err((
                status,
                "Could not produce certificate, please retry.".to_string(),
            ))
        }
    }
}

/// Certificates issued to the authenticated learner, newest first.
pub async fn list_my_certificates(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match certificate_service(&state).list_for_user(&claims.sub).await {
        Ok(records) => Ok((StatusCode::OK, Json(records))),
        Err(e) => {
            tracing::error!("Failed to list certificates: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Existing certificate for one course, so the caller can offer "view"
/// instead of regenerating.
pub async fn get_course_certificate(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match certificate_service(&state)
        .find_for_course(&claims.sub, &course_id)
        .await
    {
        Ok(Some(record)) => Ok((StatusCode::OK, Json(record))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            "No certificate has been issued for this course yet.".to_string(),
        )),
        Err(e) => {
            tracing::error!("Failed to look up certificate: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
