//! Connected sensor node entry point
//!
//! Bootstraps the node: configuration, logging, sensor hardware, link
//! monitoring, and finally the broker session once the network is up.

use clap::{Parser, Subcommand};
use sensornode::config::NodeConfig;
use sensornode::link::{HostNetwork, LinkManager};
use sensornode::observability::init_default_logging;
use sensornode::sensor::{PiSensors, SensorSource};
use sensornode::session::SessionManager;
use sensornode::transport::mqtt::{configure_mqtt_options, MqttSession};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info};

/// Connected sensor node publishing telemetry over MQTT
#[derive(Parser)]
#[command(name = "sensornode")]
#[command(about = "Connected sensor node publishing periodic telemetry over MQTT")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sensor node
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting sensornode v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_node(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<NodeConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(NodeConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations
            let default_paths = vec!["sensornode.toml", "config/sensornode.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(NodeConfig::load_from_file(&path)?);
                }
            }

            error!(
                "No configuration file found. Please provide one with -c/--config or create sensornode.toml"
            );
            process::exit(1);
        }
    }
}

async fn run_node(config: NodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Node starting with id: {}", config.node.id);

    // Fail early on a broker URL the transport cannot use; the session
    // itself is only constructed once the network is up.
    configure_mqtt_options(&config.node.id, &config.mqtt)?;

    // Sensor hardware is required; an init failure is fatal.
    let sensors: Arc<dyn SensorSource> = Arc::new(PiSensors::new(&config.sensors)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (link_event_tx, link_event_rx) = mpsc::channel(16);
    let (ready_tx, ready_rx) = oneshot::channel();

    let link_manager = LinkManager::new(
        HostNetwork::new(&config.network),
        link_event_rx,
        ready_tx,
    );
    let link_handle = tokio::spawn(link_manager.run());
    let monitor_handle = HostNetwork::spawn_monitor(
        config.network.interface.clone(),
        config.mqtt.broker_url.clone(),
        link_event_tx,
    );

    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    info!("Waiting for network...");
    let address = tokio::select! {
        ready = ready_rx => match ready {
            Ok(addr) => addr,
            Err(_) => return Err("link manager stopped before the network came up".into()),
        },
        _ = sigint.recv() => {
            info!("Received SIGINT before network came up, exiting");
            return Ok(());
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM before network came up, exiting");
            return Ok(());
        }
    };
    info!(address = %address, "Network ready, starting broker session");

    let (session, session_events) = MqttSession::connect(&config.node.id, &config.mqtt)?;
    let publisher = Arc::new(session);

    let mut session_manager = SessionManager::new(
        Arc::clone(&publisher),
        sensors,
        Duration::from_millis(config.telemetry.interval_ms),
        shutdown_rx,
    );
    let session_handle = session_manager.start(session_events)?;

    info!("Node is running");

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    // Stop the telemetry publisher, then tear the tasks down
    let _ = shutdown_tx.send(true);
    session_handle.abort();
    monitor_handle.abort();
    link_handle.abort();

    Ok(())
}

fn handle_config_command(config: NodeConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    info!("Configuration is valid");

    if show {
        let toml_output = toml::to_string_pretty(&config)?;
        println!("{toml_output}");
    }

    Ok(())
}
