// vizboard_app/src/main.rs

use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vizboard_app::cli::Cli;
use vizboard_app::config::DashboardConfig;
use vizboard_app::dashboard::Dashboard;
use vizboard_app::error::DashboardError;
use vizboard_app::replay::{run_replay, write_commands};
use vizboard_app::settings::{JsonFileBackend, SettingsStore};
use vizboard_app::transport::{LoopbackTransport, MapFileRequest, ServiceReply};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // --log-level wins over RUST_LOG; info when neither is set.
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "vizboard failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), DashboardError> {
    let config = DashboardConfig::load(Some(cli.config.as_path()))?;

    let settings = match &config.dashboard.settings_file {
        Some(path) => SettingsStore::open(Box::new(JsonFileBackend::new(path.clone())))?,
        None => SettingsStore::in_memory(),
    };

    let mut transport = LoopbackTransport::new();
    // No map server in a replay; acknowledge requests so the notices show
    // the normalized paths.
    transport.register_service(&config.dashboard.save_map_service, |req: &MapFileRequest| {
        Ok(ServiceReply {
            success: true,
            message: format!("Map from {} saved to {}", req.topic, req.file_path),
        })
    });
    transport.register_service(&config.dashboard.load_map_service, |req: &MapFileRequest| {
        Ok(ServiceReply {
            success: true,
            message: format!("Map {} loaded onto {}", req.file_path, req.topic),
        })
    });

    let mut dashboard = Dashboard::new(&config, transport, settings)?;
    dashboard.connect_all();
    dashboard.pump();

    let input = BufReader::new(File::open(&cli.input)?);
    let summary = run_replay(input, &mut dashboard)?;
    info!(
        events = summary.events,
        notices = summary.notices.len(),
        "Replay complete"
    );

    match &cli.output {
        Some(path) => write_commands(&dashboard, File::create(path)?)?,
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_commands(&dashboard, &mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}
