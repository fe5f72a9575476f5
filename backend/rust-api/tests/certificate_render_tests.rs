use anchor_lms_api::services::certificate_layout::{overlay_on_template, CertificateFields};
use printpdf::{Mm, PdfDocument, PdfPage, PdfParseOptions, PdfSaveOptions};

/// Blank single-page document standing in for the certificate artwork
/// (US Letter landscape, like the real template).
fn blank_template() -> Vec<u8> {
    let mut warnings = Vec::new();
    PdfDocument::new("Certificate of Completion")
        .with_pages(vec![PdfPage::new(Mm(279.4), Mm(215.9), Vec::new())])
        .save(&PdfSaveOptions::default(), &mut warnings)
}

fn fields(completion_line: &str) -> CertificateFields {
    CertificateFields {
        name_text: "Lauren Burrell".to_string(),
        completion_line: completion_line.to_string(),
        completion_date: "December 9, 2025".to_string(),
    }
}

#[test]
fn overlay_produces_a_new_pdf_document() {
    let template = blank_template();
    let rendered =
        overlay_on_template(&template, &fields("for completing Safety Basics")).unwrap();

    assert!(rendered.starts_with(b"%PDF"));
    assert_ne!(rendered, template);
}

#[test]
fn overlay_leaves_the_template_bytes_untouched() {
    let template = blank_template();
    let before = template.clone();
    let _ = overlay_on_template(&template, &fields("for completing Safety Basics")).unwrap();
    assert_eq!(template, before);
}

#[test]
fn rendered_document_still_has_one_page_and_more_content() {
    let template = blank_template();
    let rendered = overlay_on_template(
        &template,
        &fields("for completing Fastener Selection for Commercial Rooftop Equipment"),
    )
    .unwrap();

    let mut warnings = Vec::new();
    let template_doc =
        PdfDocument::parse(&template, &PdfParseOptions::default(), &mut warnings).unwrap();
    let rendered_doc =
        PdfDocument::parse(&rendered, &PdfParseOptions::default(), &mut warnings).unwrap();

    assert_eq!(rendered_doc.pages.len(), 1);
    assert!(rendered_doc.pages[0].ops.len() > template_doc.pages[0].ops.len());
}

#[test]
fn garbage_bytes_are_rejected() {
    let err = overlay_on_template(b"not a pdf", &fields("for completing Safety Basics"))
        .unwrap_err();
    assert!(err.to_string().contains("template"));
}

#[test]
fn template_without_pages_is_rejected() {
    let mut warnings = Vec::new();
    let empty = PdfDocument::new("Empty").save(&PdfSaveOptions::default(), &mut warnings);
    assert!(overlay_on_template(&empty, &fields("for completing Safety Basics")).is_err());
}
