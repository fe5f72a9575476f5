use anchor_lms_api::config::ObjectStorageSettings;
use anchor_lms_api::models::certificate::IssueCertificateRequest;
use anchor_lms_api::services::certificate_service::{CertificateError, CertificateService};
use anchor_lms_api::services::object_storage::ObjectStorageClient;

fn unreachable_storage() -> ObjectStorageClient {
    // Nothing listens on port 9; every fetch fails fast.
    ObjectStorageClient::new(ObjectStorageSettings {
        bucket: "anchor-lms".into(),
        region: "ru-central1".into(),
        endpoint: Some("https://127.0.0.1:9".into()),
        access_key: "key".into(),
        secret_key: "secret".into(),
        certificates_prefix: "certificates".into(),
        template_key: "templates/anchor-certificate-template.pdf".into(),
    })
    .unwrap()
}

async fn lazy_database() -> mongodb::Database {
    // The driver connects lazily; the pipeline must fail before any query.
    mongodb::Client::with_uri_str("mongodb://127.0.0.1:9/?serverSelectionTimeoutMS=500")
        .await
        .unwrap()
        .database("anchor_lms_test")
}

#[tokio::test]
async fn unreachable_template_fails_before_any_write() {
    let service = CertificateService::new(
        lazy_database().await,
        unreachable_storage(),
        "templates/anchor-certificate-template.pdf".to_string(),
    );

    let request = IssueCertificateRequest {
        course_id: "course-7".to_string(),
        name_text: "Lauren Burrell".to_string(),
        completion_line: "for completing Fastener Selection for Commercial Rooftop Equipment"
            .to_string(),
        completion_date: "December 9, 2025".to_string(),
    };

    let err = service.generate("user-1", &request).await.unwrap_err();
    assert!(matches!(err, CertificateError::TemplateUnavailable(_)));
}
