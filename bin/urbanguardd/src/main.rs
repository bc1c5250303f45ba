//! ---
//! ug_section: "01-core-functionality"
//! ug_subsection: "binary"
//! ug_type: "source"
//! ug_scope: "code"
//! ug_description: "Binary entrypoint for the UrbanGuard daemon."
//! ug_version: "v0.1.0"
//! ug_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tracing::{info, warn};
use ug_advisor::build_advisor;
use ug_api::{ApiHandle, ApiServerBuilder};
use ug_common::{init_tracing, AppConfig, LogFormat};
use ug_core::service::parse_city;
use ug_core::{
    new_registry, AssetQuery, SimulationMetrics, SimulationService, SortOrder, TickDriver,
};
use ug_report::{ComplianceReport, ReportExporter};
use ug_sim::{AssetType, City, HealthStatus};

#[derive(Debug, Parser)]
#[command(author, version, about = "UrbanGuard telemetry simulation daemon", long_about = None)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Fix the random seed for a reproducible run")]
    seed: Option<u64>,

    #[arg(long, value_enum, help = "Override the stdout log format")]
    log_format: Option<CliLogFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogFormat {
    Json,
    Pretty,
}

impl From<CliLogFormat> for LogFormat {
    fn from(value: CliLogFormat) -> Self {
        match value {
            CliLogFormat::Json => LogFormat::StructuredJson,
            CliLogFormat::Pretty => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the simulation driver and the HTTP API until interrupted")]
    Run,
    #[command(about = "Advance the simulation offline and print a per-tick summary")]
    Simulate {
        #[arg(long, default_value_t = 10)]
        ticks: u64,
    },
    #[command(about = "List assets after an optional number of ticks")]
    List {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "type", value_name = "TYPE")]
        asset_type: Option<String>,
        #[arg(long, default_value = "critical-first")]
        sort: String,
        #[arg(long, default_value_t = 0)]
        ticks: u64,
    },
    #[command(about = "Export a compliance report for one asset")]
    Report {
        asset_id: String,
        #[arg(long, value_name = "DIR", help = "Report directory (defaults to reports.directory)")]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        ticks: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/urbanguard.toml"));
    candidates.push(PathBuf::from("configs/example.dev.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;
    if let Some(seed) = cli.seed {
        config.simulation.random_seed = Some(seed);
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format.into();
    }
    init_tracing("urbanguardd", &config.logging)?;
    info!(
        source = %loaded
            .source
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "defaults".to_owned()),
        seeded = config.simulation.random_seed.is_some(),
        "configuration loaded"
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(config).await?,
        Commands::Simulate { ticks } => simulate(&config, ticks)?,
        Commands::List {
            city,
            status,
            asset_type,
            sort,
            ticks,
        } => {
            let query = AssetQuery {
                city: city.as_deref().map(parse_city).transpose()?,
                status: parse_arg::<HealthStatus>("status", status.as_deref())?,
                asset_type: parse_arg::<AssetType>("type", asset_type.as_deref())?,
                sort: sort
                    .parse::<SortOrder>()
                    .map_err(|_| anyhow!("invalid sort order '{sort}'"))?,
            };
            list(&config, &query, ticks)?
        }
        Commands::Report {
            asset_id,
            output,
            ticks,
        } => {
            let directory = output.unwrap_or_else(|| config.reports.directory.clone());
            report(&config, &asset_id, ReportExporter::new(directory), ticks)?
        }
    }

    Ok(())
}

async fn run_daemon(config: AppConfig) -> Result<()> {
    let service = Arc::new(SimulationService::from_config(&config.simulation)?);
    let registry = new_registry();
    let metrics = SimulationMetrics::new(registry.clone())?;
    service.register_observer(Arc::new(metrics));

    let driver = TickDriver::new(service.clone(), config.simulation.tick_interval).spawn();

    let mut api: Option<ApiHandle> = None;
    if config.api.enabled {
        let advisor = build_advisor(&config.advisor)?;
        let builder = ApiServerBuilder::new(
            config.api.listen,
            service.clone(),
            advisor,
            ReportExporter::new(config.reports.directory.clone()),
        )
        .with_metrics_registry(registry);
        match builder.spawn().await {
            Ok(handle) => {
                info!(address = %handle.local_addr(), "api server listening");
                api = Some(handle);
            }
            Err(err) => {
                warn!(error = %err, "failed to start api server");
            }
        }
    } else {
        info!("api server disabled by configuration");
    }

    info!(
        interval_ms = config.simulation.tick_interval.as_millis() as u64,
        "daemon running; waiting for termination signal"
    );
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");

    let stats = driver.shutdown().await?;
    info!(
        ticks = stats.ticks,
        overall_health = service.current_overall_health(),
        "simulation driver stopped"
    );
    if let Some(handle) = api {
        handle.shutdown().await?;
    }
    Ok(())
}

fn simulate(config: &AppConfig, ticks: u64) -> Result<()> {
    let service = SimulationService::from_config(&config.simulation)?;
    for _ in 0..ticks {
        let snapshot = service.tick();
        println!(
            "tick {:>4}  overall health {:>3}%  new anomalies {}",
            snapshot.generation(),
            snapshot.overall_health(),
            snapshot.emitted().len()
        );
    }

    let snapshot = service.snapshot();
    for city in [City::Chennai, City::Coimbatore] {
        let census = snapshot.status_census(city);
        println!(
            "{city}: health {}%  healthy {}  warning {}  critical {}",
            snapshot.city_health(city),
            census.healthy,
            census.warning,
            census.critical
        );
    }
    for anomaly in snapshot.notifications() {
        println!(
            "  {}  {}  {}",
            anomaly.id,
            anomaly.timestamp.to_rfc3339(),
            anomaly.description
        );
    }
    Ok(())
}

fn list(config: &AppConfig, query: &AssetQuery, ticks: u64) -> Result<()> {
    let service = SimulationService::from_config(&config.simulation)?;
    for _ in 0..ticks {
        service.tick();
    }
    for asset in service.list_assets(query) {
        println!(
            "{:<16} {:<36} {:<15} {:>6.1} {}",
            asset.id(),
            asset.name(),
            asset.asset_type(),
            asset.health_score(),
            asset.status()
        );
    }
    Ok(())
}

fn report(config: &AppConfig, asset_id: &str, exporter: ReportExporter, ticks: u64) -> Result<()> {
    let service = SimulationService::from_config(&config.simulation)?;
    for _ in 0..ticks {
        service.tick();
    }
    let asset = service.require_asset(asset_id)?;
    let report = ComplianceReport::from_asset(&asset, Utc::now());
    let exported = exporter
        .export(&report)
        .with_context(|| format!("failed to export report for {asset_id}"))?;
    println!(
        "{}\n  text: {}\n  json: {}",
        exported.report_id,
        exported.text_path.display(),
        exported.json_path.display()
    );
    Ok(())
}

fn parse_arg<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Option<T>> {
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("invalid {field} '{value}'"))
    })
    .transpose()
}
