pub(crate) mod api_error;
pub(crate) mod handlers;
pub(crate) mod state;

/// Upper bound of an AdmissionReview body, matches the API server's own
/// request size limit.
pub const MAX_REQUEST_BODY_BYTES: usize = 3 * 1024 * 1024;
