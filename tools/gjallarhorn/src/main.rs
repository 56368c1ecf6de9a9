use std::net::IpAddr;

use bifrost::communication::{DEFAULT_RELAY_HOST, DEFAULT_RELAY_PORT};
use clap::Parser;
use gjallarhorn::{Relay, server::DEFAULT_QUEUE_CAPACITY};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// Address to listen on
    #[clap(long, default_value = DEFAULT_RELAY_HOST)]
    host: IpAddr,

    /// Port to listen on
    #[clap(short, long, default_value_t = DEFAULT_RELAY_PORT)]
    port: u16,

    /// Number of frames queued per agent before frames are dropped
    #[clap(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,
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
    let relay = Relay::bind((args.host, args.port))
        .await?
        .with_queue_capacity(args.queue_capacity);

    tokio::select! {
        result = relay.run() => result?,
        result = tokio::signal::ctrl_c() => {
            result.into_diagnostic()?;
            tracing::info!("shutting down relay");
        }
    }

    Ok(())
}
