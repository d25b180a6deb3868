mod fixtures;
mod registrar;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fsroute::{Config, LoadSummary, RecordingRegistrar, RouteLoader};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::fixtures::FixtureSource;
use crate::registrar::AxumRegistrar;

#[derive(Parser)]
#[command(name = "fsroute-server")]
#[command(version, about = "Serve a directory of route fixtures over HTTP", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "fsroute.toml")]
    config: PathBuf,

    /// Directory containing route files
    #[arg(short, long)]
    routes_dir: Option<String>,

    /// Prefix for every route
    #[arg(short, long)]
    base_path: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Print the route table and exit
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(routes_dir) = &self.routes_dir {
            config.routing.routes_dir = routes_dir.clone();
        }
        if let Some(base_path) = &self.base_path {
            config.routing.base_path = base_path.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if config.routing.extensions.is_empty() {
            config.routing.extensions = FixtureSource::EXTENSIONS.iter().map(|ext| ext.to_string()).collect();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    cli.apply(&mut config);
    init_tracing(&config.logging.filter);

    let routes_dir = PathBuf::from(&config.routing.routes_dir);
    let loader = RouteLoader::with_config(FixtureSource::new(), config.routing.clone());

    if cli.dry_run {
        let mut registrar = RecordingRegistrar::new();
        let summary = loader.load(&mut registrar, &routes_dir).await?;
        for entry in registrar.entries() {
            println!("{}", entry);
        }
        report(&summary);
        return Ok(());
    }

    let mut registrar = AxumRegistrar::new();
    let summary = loader
        .load(&mut registrar, &routes_dir)
        .await
        .with_context(|| format!("Failed to load routes from {:?}", routes_dir))?;
    report(&summary);

    let app = registrar.into_router().layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// RUST_LOG wins over the configured filter
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn report(summary: &LoadSummary) {
    info!(
        "Discovered {} routes ({} ignored files)",
        summary.registered_count(),
        summary.ignored.len()
    );
    for failure in &summary.failures {
        warn!("  {} -> {}", failure.file.display(), failure.error);
    }
}
