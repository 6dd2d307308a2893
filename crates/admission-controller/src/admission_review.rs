use k8s_openapi::api::authentication::v1::UserInfo;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use serde::{Deserialize, Serialize};

use crate::errors::{DecodeError, EncodeError};
use crate::policy::AdmissionVerdict;

/// The only version of the admission API this webhook speaks.
pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_KIND: &str = "AdmissionReview";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

/// The AdmissionReview sent by the API server.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    pub kind: Option<String>,
    pub api_version: Option<String>,
    pub request: Option<AdmissionRequest>,
}

/// This models the admission/v1/AdmissionRequest object of Kubernetes.
///
/// The policy consumes only `uid` and `object`, while `name`, `namespace`
/// and `operation` end up in the validation span. The remaining fields are
/// optional so that any v1 request decodes.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    pub kind: Option<GroupVersionKind>,
    pub resource: Option<GroupVersionResource>,
    pub sub_resource: Option<String>,
    pub request_kind: Option<GroupVersionKind>,
    pub request_resource: Option<GroupVersionResource>,
    pub request_sub_resource: Option<String>,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub operation: Option<String>,
    pub user_info: Option<UserInfo>,
    pub object: Option<RawExtension>,
    pub old_object: Option<RawExtension>,
    pub dry_run: Option<bool>,
    pub options: Option<RawExtension>,
}

/// The AdmissionReview sent back to the API server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub api_version: String,
    pub kind: String,
    pub response: AdmissionResponse,
}

/// This models the admission/v1/AdmissionResponse object of Kubernetes,
/// restricted to what a validating webhook returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionResponse {
    /// Copied over from the corresponding AdmissionRequest.
    pub uid: String,

    pub allowed: bool,

    pub status: AdmissionResponseStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionResponseStatus {
    /// Empty when the request is allowed.
    #[serde(default)]
    pub message: String,
}

impl AdmissionReviewResponse {
    pub fn new(uid: &str, verdict: &AdmissionVerdict) -> Self {
        AdmissionReviewResponse {
            api_version: String::from(ADMISSION_API_VERSION),
            kind: String::from(ADMISSION_KIND),
            response: AdmissionResponse {
                uid: uid.to_owned(),
                allowed: verdict.is_allowed(),
                status: AdmissionResponseStatus {
                    message: verdict.reason().to_owned(),
                },
            },
        }
    }
}

/// Parse the body of an admission call.
///
/// Anything that does not yield a request with a usable uid is rejected:
/// without a uid there is nothing the response could be correlated with.
pub fn decode(body: &[u8]) -> Result<AdmissionRequest, DecodeError> {
    let review: AdmissionReviewRequest = serde_json::from_slice(body)?;

    if let Some(api_version) = review.api_version {
        if api_version != ADMISSION_API_VERSION {
            return Err(DecodeError::UnsupportedApiVersion(api_version));
        }
    }
    if let Some(kind) = review.kind {
        if kind != ADMISSION_KIND {
            return Err(DecodeError::UnexpectedKind(kind));
        }
    }

    let request = review.request.ok_or(DecodeError::MissingRequest)?;
    if request.uid.is_empty() {
        return Err(DecodeError::EmptyUid);
    }

    Ok(request)
}

/// Wrap a verdict into an AdmissionReview and serialize it.
pub fn encode(uid: &str, verdict: &AdmissionVerdict) -> Result<Vec<u8>, EncodeError> {
    let review = AdmissionReviewResponse::new(uid, verdict);
    Ok(serde_json::to_vec(&review)?)
}
