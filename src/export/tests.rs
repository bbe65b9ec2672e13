use super::*;

use tempfile::tempdir;

fn meta() -> RunMeta {
    RunMeta {
        embed_model: "nomic-embed-text".to_string(),
        gen_model: "llama3.1".to_string(),
        pipeline_version: "0.1.0".to_string(),
        run_timestamp: "2025-01-01T00:00:00Z".to_string(),
    }
}

fn row() -> EvidenceRow {
    EvidenceRow {
        criterion_id: "C1".to_string(),
        criterion_label: "Access control".to_string(),
        subcriterion_id: "C1.2".to_string(),
        subcriterion_label: "Quarterly access review".to_string(),
        doc_id: "deadbeef".to_string(),
        source_path: "docs/policy.txt".to_string(),
        page: 3,
        char_start: 0,
        char_end: 42,
        excerpt: "Access rights are reviewed quarterly.".to_string(),
        retrieval_method: "hybrid+ce".to_string(),
        score: 0.75,
        ce_score: 1.5,
        verified: None,
        verify_note: None,
    }
}

fn read_back(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("csv must be readable");
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let records = reader
        .records()
        .map(|r| r.expect("record").iter().map(str::to_string).collect())
        .collect();
    (headers, records)
}

#[test]
fn default_fields_write_full_header() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("evidence.csv");

    write_rows(&path, &[row()], &default_fields(), &meta()).expect("write must succeed");

    let (headers, records) = read_back(&path);
    assert_eq!(headers, DEFAULT_CSV_FIELDS.to_vec());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].len(), DEFAULT_CSV_FIELDS.len());
}

#[test]
fn rows_follow_configured_field_order() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("evidence.csv");
    let fields: Vec<String> = ["excerpt", "page", "criterion_id"]
        .iter()
        .map(|f| f.to_string())
        .collect();

    write_rows(&path, &[row()], &fields, &meta()).expect("write must succeed");

    let (headers, records) = read_back(&path);
    assert_eq!(headers, fields);
    assert_eq!(
        records[0],
        vec![
            "Access rights are reviewed quarterly.".to_string(),
            "3".to_string(),
            "C1".to_string(),
        ]
    );
}

#[test]
fn unknown_field_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("evidence.csv");
    let fields = vec!["criterion_id".to_string(), "reviewer_initials".to_string()];

    let err = write_rows(&path, &[row()], &fields, &meta()).unwrap_err();
    assert!(matches!(err, ExportError::UnknownField { field } if field == "reviewer_initials"));
    assert!(!path.exists());
}

#[test]
fn unverified_rows_leave_verification_cells_empty() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("evidence.csv");
    let fields = vec!["verified".to_string(), "verify_note".to_string()];

    write_rows(&path, &[row()], &fields, &meta()).expect("write must succeed");

    let (_, records) = read_back(&path);
    assert_eq!(records[0], vec!["".to_string(), "".to_string()]);
}

#[test]
fn verified_rows_render_flag_and_note() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("evidence.csv");
    let fields = vec!["verified".to_string(), "verify_note".to_string()];
    let mut verified_row = row();
    verified_row.verified = Some(true);
    verified_row.verify_note = Some("names the quarterly review".to_string());

    write_rows(&path, &[verified_row], &fields, &meta()).expect("write must succeed");

    let (_, records) = read_back(&path);
    assert_eq!(
        records[0],
        vec![
            "true".to_string(),
            "names the quarterly review".to_string(),
        ]
    );
}

#[test]
fn meta_columns_are_stamped_on_every_row() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("evidence.csv");
    let fields = vec![
        "doc_id".to_string(),
        "model_embed".to_string(),
        "model_generate".to_string(),
        "pipeline_version".to_string(),
        "run_timestamp".to_string(),
    ];

    write_rows(&path, &[row(), row()], &fields, &meta()).expect("write must succeed");

    let (_, records) = read_back(&path);
    assert_eq!(records.len(), 2);
    for record in records {
        assert_eq!(record[1], "nomic-embed-text");
        assert_eq!(record[2], "llama3.1");
        assert_eq!(record[3], "0.1.0");
        assert_eq!(record[4], "2025-01-01T00:00:00Z");
    }
}

#[test]
fn parent_directories_are_created() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nested/out/evidence.csv");

    write_rows(&path, &[row()], &default_fields(), &meta()).expect("write must succeed");
    assert!(path.exists());
}

#[test]
fn run_meta_captures_crate_version_and_utc_timestamp() {
    let captured = RunMeta::new("embed-model", "gen-model");

    assert_eq!(captured.pipeline_version, env!("CARGO_PKG_VERSION"));
    assert!(
        chrono::NaiveDateTime::parse_from_str(&captured.run_timestamp, "%Y-%m-%dT%H:%M:%SZ")
            .is_ok(),
        "timestamp '{}' must be second-precision RFC 3339",
        captured.run_timestamp
    );
}
