//! Run summary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::step::{StepReport, StepStatus};

/// Public endpoints of the provisioned workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceLinks {
    pub wms: String,
    pub wfs: String,
    pub preview: String,
}

impl ServiceLinks {
    /// Links below `public_url` (the GeoServer web root, not the REST root).
    pub fn new(public_url: &str, workspace: &str) -> Self {
        let base = public_url.trim_end_matches('/');
        Self {
            wms: format!("{}/{}/wms", base, workspace),
            wfs: format!("{}/{}/wfs", base, workspace),
            preview: format!(
                "{}/web/?wicket:bookmarkablePage=:org.geoserver.web.demo.MapPreviewPage",
                base
            ),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    pub links: ServiceLinks,
}

impl ProvisionReport {
    /// Best-effort steps that failed.
    pub fn warnings(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Warning(_)))
    }

    pub fn status_of(&self, step: &str) -> Option<&StepStatus> {
        self.steps
            .iter()
            .find(|s| s.name == step)
            .map(|s| &s.status)
    }
}
