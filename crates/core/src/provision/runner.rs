//! Sequential step executor.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{Config, ConfigError, ReadinessConfig};
use crate::geoserver::payload::view_sql;
use crate::geoserver::{Body, RestApi, RestRequest, RestResponse};
use crate::metrics;

use super::mutate;
use super::plan::build_plan;
use super::readiness::wait_for_ready;
use super::report::{ProvisionReport, ServiceLinks};
use super::step::{
    classify, Classification, Criticality, Mutation, Step, StepAction, StepError, StepReport,
    StepStatus, CREATED_OR_OK, OK,
};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("GeoServer did not become ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: &'static str,
        source: StepError,
        /// Steps that finished before the failure
        completed: Vec<StepReport>,
    },
}

/// Runs the provisioning steps in order against a REST API.
pub struct Provisioner {
    api: Arc<dyn RestApi>,
    steps: Vec<Step>,
    readiness: ReadinessConfig,
    wait_for_service: bool,
    links: ServiceLinks,
}

impl Provisioner {
    pub fn new(
        api: Arc<dyn RestApi>,
        steps: Vec<Step>,
        readiness: ReadinessConfig,
        links: ServiceLinks,
    ) -> Self {
        Self {
            api,
            steps,
            readiness,
            wait_for_service: true,
            links,
        }
    }

    /// Build the standard step list from `config`.
    pub fn from_config(api: Arc<dyn RestApi>, config: &Config) -> Result<Self, ConfigError> {
        let sql = view_sql(&config.layer)?;
        Ok(Self::new(
            api,
            build_plan(config, &sql),
            config.readiness.clone(),
            ServiceLinks::new(&config.provision.public_url, &config.workspace.name),
        ))
    }

    /// Start provisioning without polling the version endpoint first.
    pub fn skip_readiness_wait(mut self) -> Self {
        self.wait_for_service = false;
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Wait for the service, then execute every step in order.
    ///
    /// A failing required step stops the run; a failing best-effort step
    /// is recorded as a warning.
    pub async fn run(&self) -> Result<ProvisionReport, ProvisionError> {
        let started_at = Utc::now();

        if self.wait_for_service {
            if !wait_for_ready(self.api.as_ref(), &self.readiness).await {
                return Err(ProvisionError::NotReady {
                    attempts: self.readiness.max_attempts,
                });
            }
            if self.readiness.settle_secs > 0 {
                info!(
                    "Waiting {} seconds for GeoServer to fully initialize",
                    self.readiness.settle_secs
                );
                sleep(Duration::from_secs(self.readiness.settle_secs)).await;
            }
        }

        let total = self.steps.len();
        let mut reports = Vec::with_capacity(total);

        for (index, step) in self.steps.iter().enumerate() {
            info!("[STEP {}/{}] {}", index + 1, total, step.description);

            let status = match self.execute(step).await {
                Ok(status) => status,
                Err(e) => match step.criticality {
                    Criticality::Required => {
                        error!(step = step.name, "{} failed: {}", step.description, e);
                        metrics::record_step(step.name, "failed");
                        return Err(ProvisionError::StepFailed {
                            step: step.name,
                            source: e,
                            completed: reports,
                        });
                    }
                    Criticality::BestEffort => {
                        warn!(step = step.name, "Could not complete step: {}", e);
                        StepStatus::Warning(e.to_string())
                    }
                },
            };

            metrics::record_step(step.name, status.as_str());
            reports.push(StepReport {
                name: step.name,
                status,
            });
        }

        Ok(ProvisionReport {
            started_at,
            finished_at: Utc::now(),
            steps: reports,
            links: self.links.clone(),
        })
    }

    async fn execute(&self, step: &Step) -> Result<StepStatus, StepError> {
        match &step.action {
            StepAction::Create { request, update } => {
                let response = self.api.execute(request.clone()).await?;
                match classify(response.status, step.expected_statuses()) {
                    Classification::Success => {
                        info!(step = step.name, "Created");
                        Ok(StepStatus::Created)
                    }
                    Classification::Conflict => {
                        info!(step = step.name, "Already exists");
                        match update {
                            Some(update) => self.send_update(step, update.clone()).await,
                            None => Ok(StepStatus::AlreadyExists),
                        }
                    }
                    Classification::Failure => Err(unexpected(response)),
                }
            }
            StepAction::Upsert { request } => {
                let response = self.api.execute(request.clone()).await?;
                upsert_status(step, response)
            }
            StepAction::ReadModifyWrite {
                path,
                put_query,
                mutation,
            } => self.read_modify_write(step, path, put_query, *mutation).await,
        }
    }

    async fn send_update(&self, step: &Step, update: RestRequest) -> Result<StepStatus, StepError> {
        info!(step = step.name, "Updating existing resource");
        let response = self.api.execute(update).await?;
        match classify(response.status, CREATED_OR_OK) {
            Classification::Success => {
                info!(step = step.name, "Updated");
                Ok(StepStatus::UpdatedExisting)
            }
            Classification::Conflict => Ok(StepStatus::AlreadyExists),
            Classification::Failure => Err(unexpected(response)),
        }
    }

    async fn read_modify_write(
        &self,
        step: &Step,
        path: &str,
        put_query: &[(String, String)],
        mutation: Mutation,
    ) -> Result<StepStatus, StepError> {
        let response = self.api.execute(RestRequest::get(path)).await?;
        if classify(response.status, OK) != Classification::Success {
            return Err(unexpected(response));
        }

        let mut doc: Value = serde_json::from_str(&response.body)
            .map_err(|e| StepError::Representation(format!("invalid JSON: {}", e)))?;
        mutate::apply(mutation, &mut doc).map_err(StepError::Representation)?;

        let put = put_query.iter().fold(
            RestRequest::put(path, Body::Json(doc)),
            |request, (key, value)| request.with_query(key.clone(), value.clone()),
        );
        let response = self.api.execute(put).await?;
        match classify(response.status, CREATED_OR_OK) {
            Classification::Success => {
                info!(step = step.name, "Updated");
                Ok(StepStatus::Updated)
            }
            Classification::Conflict => Ok(StepStatus::AlreadyExists),
            Classification::Failure => Err(unexpected(response)),
        }
    }
}

fn upsert_status(step: &Step, response: RestResponse) -> Result<StepStatus, StepError> {
    match classify(response.status, step.expected_statuses()) {
        Classification::Success if response.status == 201 => {
            info!(step = step.name, "Created");
            Ok(StepStatus::Created)
        }
        Classification::Success => {
            info!(step = step.name, "Updated");
            Ok(StepStatus::Updated)
        }
        Classification::Conflict => {
            info!(step = step.name, "Already exists");
            Ok(StepStatus::AlreadyExists)
        }
        Classification::Failure => Err(unexpected(response)),
    }
}

fn unexpected(response: RestResponse) -> StepError {
    StepError::UnexpectedStatus {
        status: response.status,
        body: response.body_excerpt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConflictPolicy;
    use crate::geoserver::{GeoServerError, Method};
    use crate::testing::fixtures::{self, LAYER_PATH};
    use crate::testing::MockRestApi;
    use serde_json::json;

    const DATASTORES: &str = "/workspaces/station_pois/datastores";
    const FEATURETYPES: &str = "/workspaces/station_pois/datastores/station_pois/featuretypes";

    fn provisioner(api: &Arc<MockRestApi>, config: &Config) -> Provisioner {
        let api: Arc<dyn RestApi> = api.clone();
        Provisioner::from_config(api, config).unwrap()
    }

    fn quick_config() -> Config {
        let mut config = Config::default();
        config.readiness.max_attempts = 3;
        config.readiness.delay_secs = 1;
        config.readiness.settle_secs = 0;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path_request_counts() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;

        let report = provisioner(&api, &quick_config()).run().await.unwrap();

        assert_eq!(api.count("POST", "/workspaces").await, 1);
        assert_eq!(api.count("PUT", "/namespaces/station_pois").await, 1);
        assert_eq!(api.count("POST", DATASTORES).await, 1);
        assert_eq!(api.count("POST", FEATURETYPES).await, 1);
        assert_eq!(api.count("GET", LAYER_PATH).await, 1);
        assert_eq!(api.count("PUT", LAYER_PATH).await, 1);
        assert_eq!(api.count("GET", "/settings").await, 1);
        assert_eq!(api.count("PUT", "/settings").await, 1);
        // Probe plus the eight provisioning requests.
        assert_eq!(api.requests().await.len(), 9);

        let outcomes: Vec<_> = report.steps.iter().map(|s| s.status.as_str()).collect();
        assert_eq!(
            outcomes,
            vec!["created", "updated", "created", "created", "updated", "updated"]
        );
        assert_eq!(report.warnings().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_ready_attempts_no_step() {
        let api = Arc::new(MockRestApi::new());
        api.set_fallback(RestResponse::new(503, "down")).await;

        let result = provisioner(&api, &quick_config()).run().await;
        assert!(matches!(result, Err(ProvisionError::NotReady { attempts: 3 })));

        let requests = api.requests().await;
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.path == "/about/version.json"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_after_ready() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;
        let mut config = quick_config();
        config.readiness.settle_secs = 10;

        let start = tokio::time::Instant::now();
        provisioner(&api, &config).run().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_workspace_conflict_updates_and_continues() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;
        api.set_response("POST", "/workspaces", RestResponse::new(409, "exists"))
            .await;
        api.set_response("PUT", "/workspaces/station_pois", RestResponse::new(200, ""))
            .await;

        let report = provisioner(&api, &quick_config())
            .skip_readiness_wait()
            .run()
            .await
            .unwrap();

        assert_eq!(
            report.status_of("workspace"),
            Some(&StepStatus::UpdatedExisting)
        );
        assert_eq!(api.count("PUT", "/workspaces/station_pois").await, 1);
        assert_eq!(api.count("PUT", "/namespaces/station_pois").await, 1);
        assert_eq!(api.count("POST", DATASTORES).await, 1);
        assert_eq!(api.count("POST", FEATURETYPES).await, 1);
    }

    #[tokio::test]
    async fn test_conflict_with_skip_policy_reports_already_exists() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;
        api.set_response("POST", "/workspaces", RestResponse::new(409, "exists"))
            .await;
        api.set_response("POST", DATASTORES, RestResponse::new(409, "exists"))
            .await;
        api.set_response("POST", FEATURETYPES, RestResponse::new(409, "exists"))
            .await;

        let mut config = quick_config();
        config.provision.on_conflict = ConflictPolicy::Skip;
        let report = provisioner(&api, &config)
            .skip_readiness_wait()
            .run()
            .await
            .unwrap();

        for step in ["workspace", "datastore", "featuretype"] {
            assert_eq!(report.status_of(step), Some(&StepStatus::AlreadyExists));
        }
        let puts = api
            .requests()
            .await
            .into_iter()
            .filter(|r| r.method == Method::Put)
            .count();
        // Namespace, layer and settings only.
        assert_eq!(puts, 3);
    }

    #[tokio::test]
    async fn test_datastore_failure_halts_before_featuretype() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;
        api.set_response("POST", DATASTORES, RestResponse::new(500, "JNDI lookup failed"))
            .await;

        let result = provisioner(&api, &quick_config())
            .skip_readiness_wait()
            .run()
            .await;

        match result {
            Err(ProvisionError::StepFailed {
                step,
                source,
                completed,
            }) => {
                assert_eq!(step, "datastore");
                assert!(source.to_string().contains("HTTP 500"));
                assert!(source.to_string().contains("JNDI lookup failed"));
                assert_eq!(completed.len(), 2);
            }
            other => panic!("expected datastore failure, got {:?}", other.map(|r| r.steps)),
        }
        assert_eq!(api.count("POST", FEATURETYPES).await, 0);
        assert_eq!(api.count("GET", "/settings").await, 0);
    }

    #[tokio::test]
    async fn test_failed_update_after_conflict_is_fatal() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;
        api.set_response("POST", FEATURETYPES, RestResponse::new(409, "exists"))
            .await;
        api.set_response("PUT", LAYER_PATH, RestResponse::new(400, "bad sql"))
            .await;

        let result = provisioner(&api, &quick_config())
            .skip_readiness_wait()
            .run()
            .await;
        assert!(matches!(
            result,
            Err(ProvisionError::StepFailed { step: "featuretype", .. })
        ));
        assert_eq!(api.count("GET", LAYER_PATH).await, 0);
    }

    #[tokio::test]
    async fn test_transport_error_on_required_step_is_fatal() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;
        api.set_error("PUT", "/namespaces/station_pois", GeoServerError::Timeout)
            .await;

        let result = provisioner(&api, &quick_config())
            .skip_readiness_wait()
            .run()
            .await;
        match result {
            Err(ProvisionError::StepFailed { step, source, .. }) => {
                assert_eq!(step, "namespace");
                assert!(matches!(source, StepError::Transport(GeoServerError::Timeout)));
            }
            other => panic!("expected namespace failure, got {:?}", other.map(|r| r.steps)),
        }
        assert_eq!(api.count("POST", DATASTORES).await, 0);
    }

    #[tokio::test]
    async fn test_best_effort_failures_are_warnings() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;
        api.set_response("GET", LAYER_PATH, RestResponse::new(404, "no such layer"))
            .await;
        api.set_error(
            "PUT",
            "/settings",
            GeoServerError::ConnectionFailed("reset".to_string()),
        )
        .await;

        let report = provisioner(&api, &quick_config())
            .skip_readiness_wait()
            .run()
            .await
            .unwrap();

        assert!(matches!(report.status_of("bbox"), Some(StepStatus::Warning(_))));
        assert!(matches!(report.status_of("settings"), Some(StepStatus::Warning(_))));
        assert_eq!(report.warnings().count(), 2);
        assert_eq!(api.count("PUT", LAYER_PATH).await, 0);
    }

    #[tokio::test]
    async fn test_bbox_put_sends_full_representation_with_recalculate() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;

        provisioner(&api, &quick_config())
            .skip_readiness_wait()
            .run()
            .await
            .unwrap();

        let puts = api.requests_for("PUT", LAYER_PATH).await;
        assert_eq!(puts.len(), 1);
        assert_eq!(
            puts[0].query,
            vec![("recalculate".to_string(), "nativebbox,latlonbbox".to_string())]
        );
        let mut expected = fixtures::feature_type_json();
        expected["featureType"]["enabled"] = json!(true);
        assert_eq!(puts[0].body, Some(Body::Json(expected)));
    }

    #[tokio::test]
    async fn test_settings_put_preserves_other_keys() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;

        provisioner(&api, &quick_config())
            .skip_readiness_wait()
            .run()
            .await
            .unwrap();

        let puts = api.requests_for("PUT", "/settings").await;
        let mut expected = fixtures::settings_json();
        expected["global"]["numDecimals"] = json!(16);
        assert_eq!(puts[0].body, Some(Body::Json(expected)));
    }

    #[tokio::test]
    async fn test_invalid_settings_json_is_warning() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;
        api.set_response("GET", "/settings", RestResponse::new(200, "<html>login</html>"))
            .await;

        let report = provisioner(&api, &quick_config())
            .skip_readiness_wait()
            .run()
            .await
            .unwrap();
        match report.status_of("settings") {
            Some(StepStatus::Warning(message)) => assert!(message.contains("invalid JSON")),
            other => panic!("unexpected settings status {:?}", other),
        }
        assert_eq!(api.count("PUT", "/settings").await, 0);
    }

    #[tokio::test]
    async fn test_second_run_reports_existing_resources() {
        let api = Arc::new(MockRestApi::new());
        fixtures::script_happy_path(&api).await;
        let config = quick_config();

        let first = provisioner(&api, &config)
            .skip_readiness_wait()
            .run()
            .await
            .unwrap();
        assert_eq!(first.status_of("workspace"), Some(&StepStatus::Created));

        // The service now holds every resource.
        api.set_response("POST", "/workspaces", RestResponse::new(409, "exists"))
            .await;
        api.set_response("POST", DATASTORES, RestResponse::new(409, "exists"))
            .await;
        api.set_response("POST", FEATURETYPES, RestResponse::new(409, "exists"))
            .await;
        api.set_response("PUT", "/workspaces/station_pois", RestResponse::new(200, ""))
            .await;
        api.set_response(
            "PUT",
            "/workspaces/station_pois/datastores/station_pois",
            RestResponse::new(200, ""),
        )
        .await;

        let second = provisioner(&api, &config)
            .skip_readiness_wait()
            .run()
            .await
            .unwrap();
        for step in ["workspace", "datastore", "featuretype"] {
            assert_eq!(second.status_of(step), Some(&StepStatus::UpdatedExisting));
        }
        assert_eq!(second.warnings().count(), 0);
    }
}
