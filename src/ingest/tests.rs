use std::fs;

use tempfile::tempdir;

use super::*;

#[test]
fn clean_page_collapses_within_lines_only() {
    let cleaned = clean_page("Scope   of audit\t review\n\n  Second   paragraph  ");
    assert_eq!(cleaned, "Scope of audit review\n\nSecond paragraph");
}

#[test]
fn read_document_splits_pages_on_form_feed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.txt");
    fs::write(
        &path,
        "First page   with  spaces.\n\nSecond paragraph.\x0cSecond page text.",
    )
    .unwrap();

    let document = read_document(&path).unwrap();
    assert_eq!(document.doc_id.len(), 64);
    assert_eq!(document.pages.len(), 2);
    assert_eq!(document.pages[0].number, 1);
    assert_eq!(
        document.pages[0].text,
        "First page with spaces.\n\nSecond paragraph."
    );
    assert_eq!(document.pages[1].number, 2);
    assert_eq!(document.pages[1].text, "Second page text.");
}

#[test]
fn blank_pages_are_dropped_without_renumbering() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.md");
    fs::write(&path, "Page one.\x0c \n \x0cPage three.").unwrap();

    let document = read_document(&path).unwrap();
    assert_eq!(document.pages.len(), 2);
    assert_eq!(document.pages[0].number, 1);
    assert_eq!(document.pages[1].number, 3);
}

#[test]
fn doc_id_is_stable_for_identical_bytes() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "same content").unwrap();
    fs::write(&b, "same content").unwrap();

    assert_eq!(
        read_document(&a).unwrap().doc_id,
        read_document(&b).unwrap().doc_id
    );
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan.pdf");
    fs::write(&path, b"%PDF-1.4").unwrap();

    let err = read_document(&path).unwrap_err();
    assert!(matches!(err, DocumentError::UnsupportedFormat { .. }));
    assert!(err.to_string().contains("pdf"));
}

#[test]
fn list_documents_returns_sorted_files_only() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.txt"), "b").unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();

    let files = list_documents(dir.path()).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("a.txt"));
    assert!(files[1].ends_with("b.txt"));

    let err = list_documents(&dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, DocumentError::ScanFailed { .. }));
}

#[test]
fn stage_pages_writes_one_record_per_page() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("report.txt");
    fs::write(&source, "Page one.\x0cPage two.").unwrap();
    let document = read_document(&source).unwrap();

    let staging = dir.path().join("staging");
    let staged_path = stage_pages(&staging, &document).unwrap();
    assert!(staged_path.ends_with(format!("{}.jsonl", document.doc_id)));

    let contents = fs::read_to_string(&staged_path).unwrap();
    let records: Vec<StagedRecord> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].doc_id, document.doc_id);
    assert_eq!(records[0].page, 1);
    assert_eq!(records[0].text, "Page one.");
    assert_eq!(records[1].page, 2);
    assert_eq!(records[1].text, "Page two.");
}
