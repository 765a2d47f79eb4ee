mod cli;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use geoinit_core::{
    load_config, metrics, validate_config, Config, GeoServerClient, ProvisionError, Provisioner,
    RestApi, SanitizedConfig,
};

use cli::{Cli, Command, LogFormat, RunArgs};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let fmt_layer = match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    validate_config(&config).context("Configuration validation failed")?;

    match cli.command() {
        Some(Command::Plan { json }) => plan(&config, *json),
        Some(Command::Run(args)) => provision(&config, args).await,
        None => provision(&config, &RunArgs::default()).await,
    }
}

fn plan(config: &Config, json: bool) -> Result<()> {
    // The plan never touches the network, so a client is only built for its base URL.
    let api: Arc<dyn RestApi> =
        Arc::new(GeoServerClient::new(&config.geoserver).context("Failed to create HTTP client")?);
    let provisioner =
        Provisioner::from_config(Arc::clone(&api), config).context("Failed to build plan")?;
    let summaries: Vec<_> = provisioner.steps().iter().map(|s| s.summary()).collect();

    if json {
        let doc = serde_json::json!({
            "config": SanitizedConfig::from(config),
            "steps": summaries,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        print!("{}", output::render_plan(api.base_url(), &summaries));
    }
    Ok(())
}

async fn provision(config: &Config, args: &RunArgs) -> Result<()> {
    info!("Starting GeoServer setup");
    info!("GeoServer URL: {}", config.geoserver.url);
    info!("Workspace: {}", config.workspace.name);

    let api: Arc<dyn RestApi> =
        Arc::new(GeoServerClient::new(&config.geoserver).context("Failed to create HTTP client")?);
    let mut provisioner =
        Provisioner::from_config(api, config).context("Failed to build provisioning steps")?;
    if args.skip_wait {
        provisioner = provisioner.skip_readiness_wait();
    }

    let result = provisioner.run().await;
    let metrics_text = args.metrics.then(metrics::encode_metrics);

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(text) = &metrics_text {
                eprint!("{}", text);
            }
            match e {
                ProvisionError::StepFailed {
                    step,
                    source,
                    completed,
                } => {
                    for done in &completed {
                        info!("{} finished before the failure: {}", done.name, done.status.as_str());
                    }
                    anyhow::bail!("Setup failed at step '{}': {}", step, source);
                }
                other => return Err(other.into()),
            }
        }
    };

    if args.json {
        let mut doc = serde_json::to_value(&report)?;
        if let Some(text) = metrics_text {
            doc["metrics"] = serde_json::Value::String(text);
        }
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        print!("{}", output::render_report(&report));
        if let Some(text) = metrics_text {
            print!("{}", text);
        }
    }
    Ok(())
}
