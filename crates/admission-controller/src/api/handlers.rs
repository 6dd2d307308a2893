use axum::{
    body::{self, Body, Bytes},
    extract,
    http::{header, StatusCode},
    response::IntoResponse,
};
use futures::stream;
use std::{convert::Infallible, sync::Arc};
use tracing::{error, info, warn, Span};

use crate::{
    api::{api_error::ApiError, state::ApiServerState, MAX_REQUEST_BODY_BYTES},
    errors::AdmissionError,
};

#[tracing::instrument(
    name = "validation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        allowed=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Validate a Deployment admission request.
pub(crate) async fn validate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    request_body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let raw = body::to_bytes(request_body, MAX_REQUEST_BODY_BYTES)
        .await
        .map_err(|e| handle_admission_error(AdmissionError::ReadBody(e)))?;

    let outcome = state
        .controller
        .handle(&raw)
        .map_err(handle_admission_error)?;

    let content_length = outcome.body.len().to_string();
    let delivery = ResponseDelivery {
        allowed: outcome.allowed,
        span: Span::current(),
        handed_over: false,
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, String::from("application/json")),
            (header::CONTENT_LENGTH, content_length),
        ],
        delivery.into_body(outcome.body),
    ))
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

/// Reports the validation status once the response body has been handed
/// over to the connection, or that it never was.
struct ResponseDelivery {
    allowed: bool,
    span: Span,
    handed_over: bool,
}

impl ResponseDelivery {
    fn into_body(self, response: Vec<u8>) -> Body {
        let pending = Some((Bytes::from(response), self));

        Body::from_stream(stream::unfold(pending, |pending| async move {
            let (bytes, mut delivery) = pending?;
            delivery.handed_over = true;
            Some((Ok::<_, Infallible>(bytes), None))
        }))
    }
}

impl Drop for ResponseDelivery {
    fn drop(&mut self) {
        let _enter = self.span.enter();
        if self.handed_over {
            info!("Validation Status: {}", self.allowed);
        } else {
            error!("Error writing admission response: connection closed before the body was sent");
        }
    }
}

fn handle_admission_error(error: AdmissionError) -> ApiError {
    match &error {
        AdmissionError::ReadBody(_) | AdmissionError::Decode(_) => {
            warn!(error = %error, "Bad AdmissionReview request");
        }
        AdmissionError::Encode(_) => {
            error!(error = %error, "Cannot build AdmissionReview response");
        }
    }

    ApiError::from(error)
}
