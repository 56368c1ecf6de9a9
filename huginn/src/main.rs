use std::{net::IpAddr, path::PathBuf};

use bifrost::communication::{DEFAULT_RELAY_HOST, DEFAULT_RELAY_PORT, Role};
use clap::Parser;
use huginn::{
    Agent, behavior::Engine, communication::RelayConnection, config::HuginnConfig,
    geometry::Pose, simulation::KinematicNao,
};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// Address of the relay
    #[clap(long, default_value = DEFAULT_RELAY_HOST)]
    host: IpAddr,

    /// Port of the relay
    #[clap(short, long, default_value_t = DEFAULT_RELAY_PORT)]
    port: u16,

    /// Directory containing `huginn.toml`
    #[clap(long, default_value = "config")]
    config_dir: PathBuf,

    /// Name of the overlay to apply on top of the main config
    #[clap(short, long)]
    name: Option<String>,

    /// Role to play until the team assigns another one
    #[clap(short, long, default_value = "Unassigned")]
    role: Role,

    /// Starting position along the length of the field, in meters
    #[clap(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
    x: f32,

    /// Starting position along the width of the field, in meters
    #[clap(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
    y: f32,

    /// Starting heading in radians
    #[clap(long, default_value_t = 0.0, allow_hyphen_values = true)]
    heading: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_panic_hook();

    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .init();

    let args = Cli::parse();
    let config = HuginnConfig::load_for(&args.config_dir, args.name.as_deref()).into_diagnostic()?;

    let address = (args.host, args.port);
    let connection = match RelayConnection::connect(
        std::net::SocketAddr::from(address),
        config.sync.queue_capacity,
    )
    .await
    {
        Ok(connection) => Some(connection),
        Err(error) => {
            tracing::error!(%error, "playing without a relay");
            None
        }
    };

    let nao = KinematicNao::with_wall_clock(Pose::new(args.x, args.y, args.heading));
    let engine = Engine::new(nao.clone(), nao, config).with_role(args.role);

    Agent::new(engine, connection)
        .run(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(%error, "failed to listen for ctrl-c");
            }
        })
        .await;

    Ok(())
}
