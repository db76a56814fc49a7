//! Tests for error construction and the wire envelope.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("who"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("no"), ErrorCode::Forbidden)]
#[case(Error::not_found("gone"), ErrorCode::NotFound)]
#[case(Error::conflict("taken"), ErrorCode::Conflict)]
#[case(Error::invariant_violation("last admin"), ErrorCode::InvariantViolation)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_codes(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn blank_messages_are_rejected() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "  \t");
    assert_eq!(result, Err(ErrorValidationError::EmptyMessage));
}

#[rstest]
fn blank_trace_ids_are_rejected() {
    let result = Error::forbidden("no").try_with_trace_id(" ");
    assert_eq!(result, Err(ErrorValidationError::EmptyTraceId));
}

#[tokio::test]
async fn captures_the_trace_id_in_scope() {
    let trace_id = TraceId::generate();
    let error = TraceId::scope(trace_id, async { Error::not_found("task missing") }).await;
    assert_eq!(error.trace_id(), Some(trace_id.to_string().as_str()));
}

#[rstest]
fn serialises_the_failure_envelope() {
    let error = Error::invalid_request("assignment required")
        .with_trace_id("abc")
        .with_details(json!({ "field": "assignedTo" }));

    let value = serde_json::to_value(&error).expect("serialise error");

    assert_eq!(
        value,
        json!({
            "success": false,
            "code": "invalid_request",
            "message": "assignment required",
            "traceId": "abc",
            "error": { "field": "assignedTo" }
        })
    );
}

#[rstest]
fn decodes_envelopes_without_optional_fields() {
    let error: Error = serde_json::from_value(json!({
        "success": false,
        "code": "invariant_violation",
        "message": "cannot delete the last admin"
    }))
    .expect("decode envelope");

    assert_eq!(error.code(), ErrorCode::InvariantViolation);
    assert!(error.trace_id().is_none());
    assert!(error.details().is_none());
}

#[rstest]
fn decoding_rejects_blank_messages() {
    let result = serde_json::from_value::<Error>(json!({
        "code": "forbidden",
        "message": ""
    }));
    assert!(result.is_err());
}
