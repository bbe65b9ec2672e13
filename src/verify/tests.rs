use super::*;

#[test]
fn affirmative_response_marks_supported() {
    let verification =
        parse_verification(r#"{"supports": true, "reason": "policy names the control"}"#);
    assert!(verification.supports);
    assert_eq!(
        verification.note,
        r#"{"supports": true, "reason": "policy names the control"}"#
    );
}

#[test]
fn negative_response_marks_unsupported() {
    let verification =
        parse_verification(r#"{"supports": false, "reason": "excerpt is off-topic"}"#);
    assert!(!verification.supports);
}

#[test]
fn verdict_token_is_case_insensitive() {
    assert!(parse_verification(r#"{"supports": TRUE}"#).supports);
    assert!(parse_verification("True, the excerpt covers it.").supports);
}

#[test]
fn long_note_is_truncated_to_char_budget() {
    let response = format!(r#"{{"supports": true, "reason": "{}"}}"#, "x".repeat(400));
    let verification = parse_verification(&response);
    assert_eq!(verification.note.chars().count(), VERIFY_NOTE_MAX_CHARS);
    assert!(verification.supports);
}

#[test]
fn truncation_respects_multibyte_boundaries() {
    let response = "é".repeat(200);
    let verification = parse_verification(&response);
    assert_eq!(verification.note.chars().count(), VERIFY_NOTE_MAX_CHARS);
    assert!(!verification.supports);
}
