//! Step declarations and outcomes.

use serde::Serialize;
use thiserror::Error;

use crate::geoserver::{GeoServerError, Method, RestRequest};

/// Whether a failing step aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Required,
    BestEffort,
}

/// In-place edit applied between the GET and the PUT of a
/// read-modify-write step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    /// `featureType.enabled = true`
    EnableFeatureType,
    /// `global.numDecimals = n`
    SetNumDecimals(u32),
}

/// What a step sends.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// POST a new resource. On 409, `update` (a PUT to the existing
    /// resource) is sent when present.
    Create {
        request: RestRequest,
        update: Option<RestRequest>,
    },
    /// PUT that creates or replaces.
    Upsert { request: RestRequest },
    /// GET the JSON representation, apply `mutation`, PUT it back with
    /// `put_query` appended.
    ReadModifyWrite {
        path: String,
        put_query: Vec<(String, String)>,
        mutation: Mutation,
    },
}

/// Status codes counted as success for a POST.
pub const CREATED: &[u16] = &[201];
/// Status codes counted as success for a PUT.
pub const CREATED_OR_OK: &[u16] = &[200, 201];
/// Status codes counted as success for a GET.
pub const OK: &[u16] = &[200];

/// One provisioning step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Short identifier used in logs and metrics
    pub name: &'static str,
    pub description: String,
    pub action: StepAction,
    pub criticality: Criticality,
}

impl Step {
    /// Success codes for the step's primary request (the GET of a
    /// read-modify-write step).
    pub fn expected_statuses(&self) -> &'static [u16] {
        match self.action {
            StepAction::Create { .. } => CREATED,
            StepAction::Upsert { .. } => CREATED_OR_OK,
            StepAction::ReadModifyWrite { .. } => OK,
        }
    }

    /// Serializable overview for plan output.
    pub fn summary(&self) -> StepSummary {
        let (method, path, on_conflict, write) = match &self.action {
            StepAction::Create { request, update } => (
                request.method,
                request.display_path(),
                Some(match update {
                    Some(update) => format!("{} {}", update.method, update.display_path()),
                    None => "skip".to_string(),
                }),
                None,
            ),
            StepAction::Upsert { request } => {
                (request.method, request.display_path(), None, None)
            }
            StepAction::ReadModifyWrite {
                path, put_query, ..
            } => {
                let put = put_query.iter().fold(
                    RestRequest::new(Method::Put, path.clone()),
                    |req, (k, v)| req.with_query(k.clone(), v.clone()),
                );
                let write = WriteSummary {
                    method: put.method,
                    path: put.display_path(),
                    expected: CREATED_OR_OK.to_vec(),
                };
                (Method::Get, path.clone(), None, Some(write))
            }
        };

        StepSummary {
            name: self.name,
            description: self.description.clone(),
            method,
            path,
            expected: self.expected_statuses().to_vec(),
            criticality: self.criticality,
            on_conflict,
            write,
        }
    }
}

/// Plan entry as printed by `geoinit plan`.
#[derive(Debug, Clone, Serialize)]
pub struct StepSummary {
    pub name: &'static str,
    pub description: String,
    pub method: Method,
    pub path: String,
    pub expected: Vec<u16>,
    pub criticality: Criticality,
    /// Request sent when the create answers 409, or "skip"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_conflict: Option<String>,
    /// PUT that follows the GET of a read-modify-write step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<WriteSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub method: Method,
    pub path: String,
    pub expected: Vec<u16>,
}

/// Outcome of a step that did not abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum StepStatus {
    Created,
    Updated,
    /// Answered 409, then replaced by the conflict update
    UpdatedExisting,
    AlreadyExists,
    /// Best-effort step failed
    Warning(String),
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Created => "created",
            StepStatus::Updated => "updated",
            StepStatus::UpdatedExisting => "updated_existing",
            StepStatus::AlreadyExists => "already_exists",
            StepStatus::Warning(_) => "warning",
        }
    }
}

/// Reported result of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub name: &'static str,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Why a step did not succeed.
#[derive(Debug, Clone, Error)]
pub enum StepError {
    #[error("HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] GeoServerError),

    #[error("Unexpected representation: {0}")]
    Representation(String),
}

/// How a response status relates to a step's expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Conflict,
    Failure,
}

/// Classify `status` against the success set `expected`.
pub fn classify(status: u16, expected: &[u16]) -> Classification {
    if expected.contains(&status) {
        Classification::Success
    } else if status == 409 {
        Classification::Conflict
    } else {
        Classification::Failure
    }
}
