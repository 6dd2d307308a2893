use axum::http::StatusCode;
use thiserror::Error;

use crate::admission_review::{ADMISSION_API_VERSION, ADMISSION_KIND};

/// The inbound body is not an AdmissionReview we can correlate a response with.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot parse AdmissionReview: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "unsupported AdmissionReview apiVersion {0:?}, expected {expected:?}",
        expected = ADMISSION_API_VERSION
    )]
    UnsupportedApiVersion(String),

    #[error("unexpected kind {0:?}, expected {expected:?}", expected = ADMISSION_KIND)]
    UnexpectedKind(String),

    #[error("No Request object defined inside AdmissionReview object")]
    MissingRequest,

    #[error("AdmissionReview request has an empty uid")]
    EmptyUid,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot serialize AdmissionReview: {0}")]
    Json(#[from] serde_json::Error),
}

/// The object embedded inside of the request is not a Deployment.
#[derive(Debug, Error)]
#[error("cannot decode deployment object: {0}")]
pub struct CandidateDecodeError(#[from] pub serde_json::Error);

/// Failures of a single admission exchange that are surfaced to the caller
/// as an HTTP error instead of an admission verdict.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Error reading admission request body: {0}")]
    ReadBody(#[source] axum::Error),

    #[error("Error decoding admission request: {0}")]
    Decode(#[from] DecodeError),

    #[error("Error encoding admission response: {0}")]
    Encode(#[from] EncodeError),
}

impl AdmissionError {
    pub fn status(&self) -> StatusCode {
        match self {
            AdmissionError::ReadBody(_) | AdmissionError::Decode(_) => StatusCode::BAD_REQUEST,
            AdmissionError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_are_bad_requests() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        assert_eq!(
            AdmissionError::from(DecodeError::Json(json_error)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdmissionError::from(DecodeError::MissingRequest).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn encode_failures_are_internal_errors() {
        let json_error = serde_json::from_str::<serde_json::Value>("]").unwrap_err();

        assert_eq!(
            AdmissionError::from(EncodeError::Json(json_error)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
