pub mod config;
pub mod geoserver;
pub mod metrics;
pub mod provision;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ConflictPolicy,
    GeometryType, SanitizedConfig, DEFAULT_CONFIG_PATH,
};
pub use geoserver::{
    Body, GeoServerClient, GeoServerError, Method, RestApi, RestRequest, RestResponse,
};
pub use provision::{
    build_plan, wait_for_ready, Criticality, ProvisionError, ProvisionReport, Provisioner,
    ServiceLinks, Step, StepAction, StepError, StepReport, StepStatus, StepSummary, WriteSummary,
};
