use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use channelio::{DEFAULT_CHANNEL_CAPACITY, Scope};
use clap::{Args, Parser, Subcommand};
use log::info;

mod client;
mod codec;
mod config;
mod server;

use client::RelayClient;
use config::{DEFAULT_MAX_LINE_LENGTH, RelayConfig, Target};
use server::RelayServer;

#[derive(Parser)]
#[command(author, version, about = "Newline-delimited relay over TCP or Unix sockets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
    /// Ends each session after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Capacity of the line channels
    #[arg(long, global = true, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    buffer: usize,
    /// Longest accepted line, in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,
}

#[derive(Subcommand)]
enum Mode {
    #[command(about = "Echo every line back on each accepted connection")]
    Listen {
        #[command(flatten)]
        endpoint: Endpoint,
    },
    #[command(about = "Send stdin lines to a server and print its replies")]
    Connect {
        #[command(flatten)]
        endpoint: Endpoint,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Endpoint {
    #[arg(long)]
    tcp: Option<SocketAddr>,
    #[arg(long)]
    unix: Option<PathBuf>,
}

impl Endpoint {
    fn into_target(self) -> io::Result<Target> {
        match (self.tcp, self.unix) {
            (Some(addr), _) => Ok(Target::Tcp(addr)),
            (None, Some(path)) => Ok(Target::Unix(path)),
            (None, None) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "expected --tcp or --unix",
            )),
        }
    }
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = RelayConfig::new()
        .with_buffer(cli.buffer)
        .with_max_line_length(cli.max_line_length)
        .with_timeout(cli.timeout.map(Duration::from_secs));

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(cli.mode, config));

    // A pending stdin read cannot be cancelled; don't wait for it.
    runtime.shutdown_background();
    result
}

async fn run(mode: Mode, config: RelayConfig) -> io::Result<()> {
    let scope = Scope::new();

    let interrupt = scope.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            interrupt.cancel();
        }
    });

    match mode {
        Mode::Listen { endpoint } => {
            RelayServer::new(endpoint.into_target()?, config)
                .run(&scope)
                .await
        }
        Mode::Connect { endpoint } => {
            let session = config.session_scope(&scope);
            RelayClient::new(endpoint.into_target()?, config)
                .run(&session)
                .await
        }
    }
}
