//! Response classification shared by every client call.

use std::io::{self, Write};

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{LlapiError, MAX_ERROR_BODY_CHARS, Result, truncate_str};
use crate::response::{ApiResponse, Payload};

/// What the call site expects back from a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Json,
    /// File downloads: the body is returned unmodified.
    Bytes,
}

/// Extracts a human-readable detail from an error body.
///
/// Prefers a `message`, `error` or `detail` field of a JSON object, then the
/// whole JSON value, then the raw text truncated for display.
pub(crate) fn server_detail(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        for field in ["message", "error", "detail"] {
            if let Some(detail) = value.get(field) {
                return match detail {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
            }
        }
        return truncate_str(&value.to_string(), MAX_ERROR_BODY_CHARS).to_string();
    }
    truncate_str(text.trim(), MAX_ERROR_BODY_CHARS).to_string()
}

/// Maps a non-success status to the matching error.
pub(crate) fn parse_error_response(status: StatusCode, body: &[u8]) -> LlapiError {
    let detail = server_detail(body);
    let code = status.as_u16();
    match code {
        401 | 403 => LlapiError::Authentication {
            status: code,
            detail,
        },
        404 => LlapiError::NotFound { detail },
        400 | 422 => LlapiError::Validation {
            status: Some(code),
            detail,
        },
        500..=599 => LlapiError::Server {
            status: code,
            detail,
        },
        _ => LlapiError::Protocol(format!("unexpected HTTP {} with body: {}", status, detail)),
    }
}

/// Parses a successful response body.
pub(crate) fn parse_success_response(
    status: StatusCode,
    body: Vec<u8>,
    expect: Expect,
) -> Result<ApiResponse> {
    let payload = match expect {
        Expect::Bytes => Payload::Bytes(body),
        Expect::Json => {
            let value = serde_json::from_slice(&body).map_err(|e| {
                LlapiError::Protocol(format!(
                    "error parsing JSON response: {} (body: {})",
                    e,
                    truncate_str(&String::from_utf8_lossy(&body), MAX_ERROR_BODY_CHARS)
                ))
            })?;
            Payload::Json(value)
        }
    };
    Ok(ApiResponse {
        status: status.as_u16(),
        payload,
    })
}

/// Handles response parsing for both success and error cases.
pub(crate) fn handle_response(
    status: StatusCode,
    body: Vec<u8>,
    expect: Expect,
) -> Result<ApiResponse> {
    if status.is_success() {
        parse_success_response(status, body, expect)
    } else {
        Err(parse_error_response(status, &body))
    }
}

/// Appends `\n` unless `bytes` already ends with one.
pub fn ensure_trailing_newline(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.last() != Some(&b'\n') {
        bytes.push(b'\n');
    }
    bytes
}

/// Writes downloaded content to `sink`, guaranteeing a trailing newline.
pub fn write_download<W: Write>(sink: &mut W, bytes: &[u8]) -> io::Result<()> {
    sink.write_all(bytes)?;
    if bytes.last() != Some(&b'\n') {
        sink.write_all(b"\n")?;
    }
    sink.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let auth = parse_error_response(StatusCode::UNAUTHORIZED, b"{}");
        assert!(matches!(auth, LlapiError::Authentication { status: 401, .. }));

        let forbidden = parse_error_response(StatusCode::FORBIDDEN, b"{}");
        assert!(matches!(forbidden, LlapiError::Authentication { status: 403, .. }));

        let missing = parse_error_response(StatusCode::NOT_FOUND, b"{}");
        assert!(matches!(missing, LlapiError::NotFound { .. }));

        let invalid = parse_error_response(StatusCode::UNPROCESSABLE_ENTITY, b"{}");
        assert!(matches!(
            invalid,
            LlapiError::Validation {
                status: Some(422),
                ..
            }
        ));

        let server = parse_error_response(StatusCode::INTERNAL_SERVER_ERROR, b"oops");
        assert!(matches!(server, LlapiError::Server { status: 500, .. }));

        let other = parse_error_response(StatusCode::CONFLICT, b"");
        assert!(matches!(other, LlapiError::Protocol(_)));
    }

    #[test]
    fn validation_carries_server_detail() {
        let err = parse_error_response(
            StatusCode::BAD_REQUEST,
            br#"{"success": false, "message": "Invalid format"}"#,
        );
        match err {
            LlapiError::Validation { status, detail } => {
                assert_eq!(status, Some(400));
                assert_eq!(detail, "Invalid format");
            }
            other => panic!("expected Validation, got: {:?}", other),
        }
    }

    #[test]
    fn html_error_body_is_truncated() {
        let body = format!("<html>{}</html>", "x".repeat(500));
        let detail = server_detail(body.as_bytes());
        assert_eq!(detail.chars().count(), MAX_ERROR_BODY_CHARS);
        assert!(detail.starts_with("<html>"));
    }

    #[test]
    fn invalid_json_is_protocol_error() {
        let err = handle_response(StatusCode::OK, b"<html>".to_vec(), Expect::Json).unwrap_err();
        assert!(matches!(err, LlapiError::Protocol(_)));
    }

    #[test]
    fn bytes_are_returned_unmodified() {
        let resp = handle_response(StatusCode::OK, b"a,b\n1,2".to_vec(), Expect::Bytes).unwrap();
        assert_eq!(resp.raw_bytes(), Some(&b"a,b\n1,2"[..]));
        assert!(resp.json().is_none());
    }

    #[test]
    fn trailing_newline_added_once() {
        assert_eq!(ensure_trailing_newline(b"data".to_vec()), b"data\n");
        assert_eq!(ensure_trailing_newline(b"data\n".to_vec()), b"data\n");
        assert_eq!(ensure_trailing_newline(Vec::new()), b"\n");
    }

    #[test]
    fn write_download_is_idempotent_on_newline() {
        let mut sink = Vec::new();
        write_download(&mut sink, b"cve,score\n").unwrap();
        assert_eq!(sink, b"cve,score\n");

        let mut sink = Vec::new();
        write_download(&mut sink, b"cve,score").unwrap();
        assert_eq!(sink, b"cve,score\n");
    }
}
