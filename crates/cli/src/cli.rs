use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use geoinit_core::Config;

/// Command-line arguments for `geoinit`.
#[derive(Debug, Parser)]
#[command(
    name = "geoinit",
    version,
    about = "Provision a GeoServer workspace, PostGIS store and SQL view layer",
    long_about = "Waits for GeoServer to answer, then creates (or updates) the workspace, \
                  namespace, JNDI PostGIS datastore and SQL view layer, recalculates the \
                  layer bounding boxes and sets the global numDecimals setting."
)]
pub struct Cli {
    /// Configuration file (defaults to ./geoinit.toml when present)
    #[arg(short, long, global = true, env = "GEOINIT_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// GeoServer REST root, overrides GEOSERVER_URL
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Admin user, overrides GEOSERVER_USER
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Admin password, overrides GEOSERVER_PASSWORD
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Provision GeoServer (default)
    Run(RunArgs),
    /// Print the steps that would run, without contacting GeoServer
    Plan {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Do not poll the version endpoint before provisioning
    #[arg(long)]
    pub skip_wait: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    pub metrics: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.geoserver.url = url.clone();
        }
        if let Some(user) = &self.user {
            config.geoserver.username = user.clone();
        }
        if let Some(password) = &self.password {
            config.geoserver.password = password.clone();
        }
    }

    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }
}
