//! Train Sensor Simulator CLI
//!
//! Publishes simulated seat, noise and temperature events for one train, either
//! to stdout or to an MQTT broker.

use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trainsim_engine::SimConfig;
use trainsim_publisher::{LocalPublisher, MqttConfig, MqttPublisher, Publisher};
use trainsim_simulator::{Simulator, SimulatorConfig};

#[derive(Parser)]
#[command(name = "train-sim")]
#[command(about = "Sensor event simulator for a train fleet")]
#[command(version)]
struct Cli {
    /// Train identifier used in topics and event headers
    #[arg(long, default_value = "IC-123")]
    train: String,

    /// Number of carriages
    #[arg(long, default_value = "2")]
    carriages: u32,

    /// Seats per carriage
    #[arg(long, default_value = "32")]
    seats: u32,

    /// Base delay between event cycles (e.g., "2s", "500ms")
    #[arg(long, default_value = "2s")]
    interval: humantime::Duration,

    /// Maximum random deviation from the base delay
    #[arg(long, default_value = "500ms")]
    jitter: humantime::Duration,

    /// Random seed (0 derives one from the clock)
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Stop after this long instead of running until interrupted
    #[arg(short, long)]
    duration: Option<humantime::Duration>,

    /// MQTT broker URL (e.g., "tcp://localhost:1883"); prints to stdout when empty
    #[arg(long, default_value = "")]
    broker: String,

    /// MQTT client identifier
    #[arg(long, default_value = "train-seat-sim")]
    client_id: String,

    /// MQTT quality of service (0, 1 or 2)
    #[arg(long, default_value = "0")]
    qos: u8,

    /// Publish with the MQTT retain flag
    #[arg(long)]
    retain: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays free for published events.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let sim = SimConfig::new(cli.train)
        .with_carriages(cli.carriages)
        .with_seats_per_carriage(cli.seats)
        .with_base_interval(*cli.interval)
        .with_jitter(*cli.jitter)
        .with_seed(cli.seed);
    sim.validate()?;

    let publisher: Arc<dyn Publisher> = if cli.broker.is_empty() {
        info!("No broker configured, publishing to stdout");
        Arc::new(LocalPublisher::stdout())
    } else {
        let config = MqttConfig::new(cli.broker)
            .with_client_id(cli.client_id)
            .with_credentials_from_env()
            .with_insecure_skip_verify(cli.insecure)
            .with_qos(cli.qos)
            .with_retain(cli.retain);
        Arc::new(MqttPublisher::connect(config).await?)
    };

    let simulator = Simulator::new(SimulatorConfig::new(sim), publisher)?;
    info!(seed = simulator.seed(), "Simulator ready");

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));
    if let Some(duration) = cli.duration {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(*duration).await;
            cancel.cancel();
        });
    }

    let report = simulator.run_until_cancelled(cancel).await?;
    report.print();

    Ok(())
}

/// Cancel the run on SIGINT or SIGTERM.
///
/// If no handler can be installed the run is left to `--duration`.
async fn cancel_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                let ctrl_c = tokio::select! {
                    result = tokio::signal::ctrl_c() => Some(result),
                    _ = terminate.recv() => None,
                };
                if let Some(Err(e)) = ctrl_c {
                    warn!(error = %e, "Failed to listen for Ctrl-C, waiting for SIGTERM");
                    terminate.recv().await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                wait_for_ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    wait_for_ctrl_c().await;

    info!("Shutdown requested, stopping simulator");
    cancel.cancel();
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, signals will not stop the run");
        std::future::pending::<()>().await;
    }
}
