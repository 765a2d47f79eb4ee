use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub geoserver: GeoServerConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub datastore: DatastoreConfig,
    #[serde(default)]
    pub layer: LayerConfig,
    #[serde(default)]
    pub settings: GlobalSettingsConfig,
    #[serde(default)]
    pub provision: ProvisionConfig,
}

/// Target service endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoServerConfig {
    /// REST root, e.g. "http://geoserver:8080/geoserver/rest"
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    /// Timeout applied to every provisioning request
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for GeoServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_username(),
            password: default_password(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_url() -> String {
    "http://geoserver:8080/geoserver/rest".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "geoserver".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Readiness polling before the first provisioning request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between two probes
    #[serde(default = "default_delay")]
    pub delay_secs: u64,
    /// Timeout of a single probe
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u32,
    /// Extra wait after the service answered, before the first write
    #[serde(default = "default_settle")]
    pub settle_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay(),
            probe_timeout_secs: default_probe_timeout(),
            settle_secs: default_settle(),
        }
    }
}

fn default_max_attempts() -> u32 {
    30
}

fn default_delay() -> u64 {
    5
}

fn default_probe_timeout() -> u32 {
    5
}

fn default_settle() -> u64 {
    10
}

/// Workspace and its namespace.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_resource_name")]
    pub name: String,
    #[serde(default = "default_namespace_uri")]
    pub namespace_uri: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            name: default_resource_name(),
            namespace_uri: default_namespace_uri(),
        }
    }
}

fn default_resource_name() -> String {
    "station_pois".to_string()
}

fn default_namespace_uri() -> String {
    "http://localhost:8080/geoserver/station_pois".to_string()
}

/// JNDI-backed PostGIS datastore.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatastoreConfig {
    #[serde(default = "default_resource_name")]
    pub name: String,
    #[serde(default = "default_jndi_reference")]
    pub jndi_reference: String,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            name: default_resource_name(),
            jndi_reference: default_jndi_reference(),
        }
    }
}

fn default_jndi_reference() -> String {
    "java:comp/env/jdbc/postgres".to_string()
}

/// SQL view feature layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayerConfig {
    #[serde(default = "default_resource_name")]
    pub name: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_geometry_column")]
    pub geometry_column: String,
    #[serde(default)]
    pub geometry_type: GeometryType,
    #[serde(default = "default_srid")]
    pub srid: u32,
    #[serde(default = "default_key_column")]
    pub key_column: String,
    /// Read the view query from this file instead of the bundled one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_file: Option<PathBuf>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            name: default_resource_name(),
            title: default_title(),
            geometry_column: default_geometry_column(),
            geometry_type: GeometryType::default(),
            srid: default_srid(),
            key_column: default_key_column(),
            sql_file: None,
        }
    }
}

fn default_title() -> String {
    "Station POIs".to_string()
}

fn default_geometry_column() -> String {
    "geometry".to_string()
}

fn default_srid() -> u32 {
    4326
}

fn default_key_column() -> String {
    "gas_station_id".to_string()
}

/// Geometry types accepted by a JDBC virtual table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum GeometryType {
    #[default]
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
    Geometry,
}

impl GeometryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::LineString => "LineString",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
            GeometryType::Geometry => "Geometry",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global service settings written by the final step.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalSettingsConfig {
    #[serde(default = "default_num_decimals")]
    pub num_decimals: u32,
}

impl Default for GlobalSettingsConfig {
    fn default() -> Self {
        Self {
            num_decimals: default_num_decimals(),
        }
    }
}

fn default_num_decimals() -> u32 {
    16
}

/// Sequencer behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvisionConfig {
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
    /// Base URL used for the service links in the run summary
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            on_conflict: ConflictPolicy::default(),
            public_url: default_public_url(),
        }
    }
}

fn default_public_url() -> String {
    "http://localhost:8080/geoserver".to_string()
}

/// What a create step does when the resource already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// PUT the same representation to the existing resource
    #[default]
    Update,
    /// Leave the existing resource alone
    Skip,
}

/// Sanitized config for display (password redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub geoserver: SanitizedGeoServerConfig,
    pub readiness: ReadinessConfig,
    pub workspace: WorkspaceConfig,
    pub datastore: DatastoreConfig,
    pub layer: LayerConfig,
    pub settings: GlobalSettingsConfig,
    pub provision: ProvisionConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeoServerConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            geoserver: SanitizedGeoServerConfig {
                url: config.geoserver.url.clone(),
                username: config.geoserver.username.clone(),
                password_configured: !config.geoserver.password.is_empty(),
                timeout_secs: config.geoserver.timeout_secs,
            },
            readiness: config.readiness.clone(),
            workspace: config.workspace.clone(),
            datastore: config.datastore.clone(),
            layer: config.layer.clone(),
            settings: config.settings.clone(),
            provision: config.provision.clone(),
        }
    }
}
