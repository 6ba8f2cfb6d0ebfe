mod common;

use base64::Engine as _;

use common::{para, write_docx, FakeOracle, SECTION};

use docx_stylist::classify::{DelegatedClassifier, DelegationSettings, Label};
use docx_stylist::docx::WordDocument;
use docx_stylist::report::{
    classification_report, process_document, summarize_document, SUMMARY_UNAVAILABLE,
};

fn three_paragraphs() -> String {
    [
        para("Quarterly Update"),
        para("Revenue grew in every region during the quarter, led by strong retail sales."),
        para("Table 1: Revenue by region"),
        SECTION.to_string(),
    ]
    .concat()
}

fn oracle(labels: Option<&str>, summary: Option<&str>) -> DelegatedClassifier {
    DelegatedClassifier::new(
        Box::new(FakeOracle {
            labels: labels.map(str::to_string),
            summary: summary.map(str::to_string),
        }),
        DelegationSettings::default(),
    )
}

#[test]
fn classify_report_lists_every_non_empty_paragraph() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.docx");
    write_docx(&input, &three_paragraphs());

    let report = classification_report(&input, &oracle(Some(r#"["title","body","caption"]"#), None))
        .expect("report");
    assert_eq!(report.labels(), vec![Label::Title, Label::Body, Label::Caption]);
    assert_eq!(report.paragraphs[2].index, 2);
    assert_eq!(report.paragraphs[0].text_preview, "Quarterly Update");
    assert_eq!(report.summary.get(&Label::Title), Some(&1));
}

#[test]
fn classify_without_delegation_is_an_error_unless_document_is_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.docx");
    write_docx(&input, &three_paragraphs());
    assert!(classification_report(&input, &DelegatedClassifier::unavailable()).is_err());

    let empty = dir.path().join("empty.docx");
    write_docx(&empty, &format!("<w:p/>{SECTION}"));
    let report = classification_report(&empty, &DelegatedClassifier::unavailable()).expect("report");
    assert!(report.paragraphs.is_empty());
    assert!(report.summary.is_empty());
}

#[test]
fn summary_comes_from_the_oracle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.docx");
    write_docx(&input, &three_paragraphs());

    let summary = summarize_document(&input, &oracle(None, Some(" Revenue rose. \n")))
        .expect("summarize");
    assert_eq!(summary.as_deref(), Some("Revenue rose."));

    let none = summarize_document(&input, &DelegatedClassifier::unavailable()).expect("summarize");
    assert_eq!(none, None);
}

#[test]
fn process_formats_with_the_reported_labels() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("update.docx");
    let output = dir.path().join("formatted_update.docx");
    write_docx(&input, &three_paragraphs());

    let outcome = process_document(
        &input,
        &output,
        &oracle(Some(r#"["heading","title","body"]"#), None),
    )
    .expect("process");
    assert_eq!(outcome.filename, "formatted_update.docx");
    assert_eq!(outcome.summary, SUMMARY_UNAVAILABLE);
    assert_eq!(outcome.classification.get(&Label::Heading), Some(&1));
    assert_eq!(outcome.classification.get(&Label::Caption), None);

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&outcome.formatted_file_base64)
        .expect("base64");
    assert_eq!(decoded, std::fs::read(&output).expect("read output"));

    let doc = WordDocument::open(&output).expect("open output");
    assert!(doc.paragraphs().all(|p| !p.has_page_break_before()));

    let json = serde_json::to_value(&outcome).expect("json");
    assert_eq!(json["classification"]["title"], 1);
}

#[test]
fn process_requires_labels() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("in.docx");
    let output = dir.path().join("out.docx");
    write_docx(&input, &three_paragraphs());

    assert!(process_document(&input, &output, &oracle(Some("[]"), Some("x"))).is_err());
    assert!(!output.exists());
}
