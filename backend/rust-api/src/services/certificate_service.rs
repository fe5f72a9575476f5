use anyhow::{Context, Result};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Database;
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::CERTIFICATES_GENERATED_TOTAL;
use crate::models::certificate::{CertificateRecord, IssueCertificateRequest};

use super::certificate_layout::{overlay_on_template, CertificateFields};
use super::object_storage::ObjectStorageClient;

/// Pipeline failures, one per I/O collaborator. None is retried here; the
/// caller decides whether to offer a retry. A failed generation never leaves
/// a metadata record behind, and the quiz pass that earned the certificate
/// is unaffected.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("certificate template unavailable")]
    TemplateUnavailable(#[source] anyhow::Error),
    #[error("certificate upload failed")]
    StorageUploadFailed(#[source] anyhow::Error),
    #[error("certificate record could not be saved")]
    RecordPersistFailed(#[source] anyhow::Error),
}

impl CertificateError {
    fn metric_label(&self) -> &'static str {
        match self {
            CertificateError::TemplateUnavailable(_) => "template_unavailable",
            CertificateError::StorageUploadFailed(_) => "upload_failed",
            CertificateError::RecordPersistFailed(_) => "record_failed",
        }
    }
}

pub struct CertificateService {
    mongo: Database,
    storage: ObjectStorageClient,
    template_key: String,
}

impl CertificateService {
    pub fn new(mongo: Database, storage: ObjectStorageClient, template_key: String) -> Self {
        Self {
            mongo,
            storage,
            template_key,
        }
    }

    /// Runs the generation pipeline: fetch template, draw the three text
    /// regions, upload the new PDF, persist the metadata record.
    ///
    /// The caller has already verified the learner's passing quiz result for
    /// this course; nothing is re-checked here. Calling twice produces two
    /// stored artifacts with two serials.
    pub async fn generate(
        &self,
        user_id: &str,
        request: &IssueCertificateRequest,
    ) -> Result<CertificateRecord, CertificateError> {
        let outcome = self.generate_inner(user_id, request).await;
        let label = match &outcome {
            Ok(_) => "ok",
            Err(err) => err.metric_label(),
        };
        CERTIFICATES_GENERATED_TOTAL
            .with_label_values(&[label])
            .inc();
        outcome
    }

    async fn generate_inner(
        &self,
        user_id: &str,
        request: &IssueCertificateRequest,
    ) -> Result<CertificateRecord, CertificateError> {
        let template = self
            .storage
            .fetch_object(&self.template_key)
            .await
            .map_err(CertificateError::TemplateUnavailable)?;

        let fields = CertificateFields {
            name_text: request.name_text.clone(),
            completion_line: request.completion_line.clone(),
            completion_date: request.completion_date.clone(),
        };
        // An unreadable template is a template problem, not a storage one.
        let pdf = overlay_on_template(&template, &fields)
            .map_err(CertificateError::TemplateUnavailable)?;

        let issued_at = Utc::now();
        let object_key =
            ObjectStorageClient::certificate_object_key(user_id, &request.course_id, issued_at);
        self.storage
            .upload_bytes(&object_key, pdf, "application/pdf")
            .await
            .map_err(CertificateError::StorageUploadFailed)?;

        // Metadata goes in only after the artifact exists, so a record never
        // points at a missing object.
        let record = CertificateRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            course_id: request.course_id.clone(),
            certificate_url: self.storage.public_object_url(&object_key),
            certificate_number: issue_serial(),
            issued_at,
            completed_at: issued_at,
        };
        self.mongo
            .collection::<CertificateRecord>("certificates")
            .insert_one(&record)
            .await
            .context("failed to insert certificate record")
            .map_err(CertificateError::RecordPersistFailed)?;

        tracing::info!(
            user = user_id,
            course = %request.course_id,
            serial = %record.certificate_number,
            "certificate issued"
        );
        Ok(record)
    }

    /// Certificates issued to one learner, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<CertificateRecord>> {
        self.mongo
            .collection::<CertificateRecord>("certificates")
            .find(doc! { "user_id": user_id })
            .sort(doc! { "issued_at": -1 })
            .await
            .context("failed to query certificates")?
            .try_collect()
            .await
            .context("failed to read certificates")
    }

    /// Most recent certificate for one learner and course, if any. Lets the
    /// caller offer "view" instead of "generate" when one already exists.
    pub async fn find_for_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<CertificateRecord>> {
        self.mongo
            .collection::<CertificateRecord>("certificates")
            .find_one(doc! { "user_id": user_id, "course_id": course_id })
            .sort(doc! { "issued_at": -1 })
            .await
            .context("failed to look up certificate")
    }
}

/// 8 random decimal digits, leading zeros allowed. Display-only: serials are
/// not checked for collisions.
fn issue_serial() -> String {
    let mut rng = rand::rng();
    (0..8)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serials_are_eight_decimal_digits() {
        for _ in 0..100 {
            let serial = issue_serial();
            assert_eq!(serial.len(), 8);
            assert!(serial.chars().all(|ch| ch.is_ascii_digit()));
        }
    }

    #[test]
    fn consecutive_serials_are_not_all_identical() {
        let serials: Vec<String> = (0..20).map(|_| issue_serial()).collect();
        assert!(serials.iter().any(|serial| serial != &serials[0]));
    }
}
