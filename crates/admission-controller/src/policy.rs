use chrono::{DateTime, Datelike, FixedOffset, Local, Utc, Weekday};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use tracing::{error, info};

use crate::admission_review::AdmissionRequest;
use crate::errors::CandidateDecodeError;

pub const POLICY_VIOLATION_MESSAGE: &str = "Creating new Deployments on Fridays is not allowed.";
pub const INVALID_OBJECT_MESSAGE: &str = "Error decoding deployment object.";

/// Tells whether the request being evaluated has to be denied.
///
/// Implemented for any `Fn() -> bool`, so tests can pin the outcome with a
/// closure.
#[cfg_attr(test, mockall::automock)]
pub trait DecisionPredicate: Send + Sync {
    fn should_deny(&self) -> bool;
}

impl<F> DecisionPredicate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn should_deny(&self) -> bool {
        self()
    }
}

/// Denies when the current day is a Friday.
///
/// The day is computed in the local timezone of the host unless a fixed
/// UTC offset is given.
#[derive(Clone, Copy, Debug, Default)]
pub struct IsFriday {
    offset: Option<FixedOffset>,
}

impl IsFriday {
    pub fn local() -> Self {
        IsFriday::default()
    }

    pub fn with_offset(offset: FixedOffset) -> Self {
        IsFriday {
            offset: Some(offset),
        }
    }

    pub fn is_friday_at(&self, instant: DateTime<Utc>) -> bool {
        let weekday = match self.offset {
            Some(offset) => instant.with_timezone(&offset).weekday(),
            None => instant.with_timezone(&Local).weekday(),
        };
        weekday == Weekday::Fri
    }
}

impl DecisionPredicate for IsFriday {
    fn should_deny(&self) -> bool {
        self.is_friday_at(Utc::now())
    }
}

/// The bits of the Deployment the policy looks at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateResource {
    pub name: String,
    pub namespace: String,
}

impl CandidateResource {
    /// An absent object yields an empty candidate, a present one must be a
    /// Deployment.
    pub fn from_raw(object: Option<&RawExtension>) -> Result<Self, CandidateDecodeError> {
        let Some(raw) = object else {
            return Ok(CandidateResource::default());
        };

        let deployment: Deployment = serde_json::from_value(raw.0.clone())?;
        Ok(CandidateResource {
            name: deployment.metadata.name.unwrap_or_default(),
            namespace: deployment.metadata.namespace.unwrap_or_default(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenialCause {
    /// The decision predicate rejected the request.
    Policy,
    /// The embedded object could not be decoded.
    InvalidObject,
}

/// Outcome of a policy evaluation.
///
/// A reason exists only for denials, so an allowed verdict never carries a
/// message and a denied one always does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionVerdict {
    Allowed,
    Denied { cause: DenialCause, reason: String },
}

impl AdmissionVerdict {
    pub fn deny(cause: DenialCause, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        debug_assert!(!reason.is_empty(), "a denial must explain itself");
        AdmissionVerdict::Denied { cause, reason }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionVerdict::Allowed)
    }

    pub fn reason(&self) -> &str {
        match self {
            AdmissionVerdict::Allowed => "",
            AdmissionVerdict::Denied { reason, .. } => reason,
        }
    }
}

/// Decide about a decoded request.
///
/// The predicate is consulted only once the embedded object is known to be
/// a Deployment.
pub fn evaluate(request: &AdmissionRequest, predicate: &dyn DecisionPredicate) -> AdmissionVerdict {
    let candidate = match CandidateResource::from_raw(request.object.as_ref()) {
        Ok(candidate) => candidate,
        Err(e) => {
            error!(error = %e, request_uid = request.uid.as_str(), "Error decoding deployment");
            return AdmissionVerdict::deny(DenialCause::InvalidObject, INVALID_OBJECT_MESSAGE);
        }
    };

    if predicate.should_deny() {
        info!(
            deployment = candidate.name.as_str(),
            namespace = candidate.namespace.as_str(),
            "Denying the request to create a new Deployment on Friday"
        );
        return AdmissionVerdict::deny(DenialCause::Policy, POLICY_VIOLATION_MESSAGE);
    }

    info!(
        deployment = candidate.name.as_str(),
        namespace = candidate.namespace.as_str(),
        "Allowing the request to create a new Deployment"
    );
    AdmissionVerdict::Allowed
}
