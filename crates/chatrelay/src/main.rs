use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use tokio::net::TcpListener;
use tracing::info;

use chatrelay::api::{self, AppState};
use chatrelay::relay::RelayService;
use chatrelay::settings::Settings;
use chatrelay::upstream::UpstreamClient;

#[derive(Debug, Parser)]
#[command(author, version, about = "Chatrelay - chatroom feed relay server.")]
struct Cli {
    /// Override the config file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Host address to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
    /// Reduce output to only errors
    #[arg(short, long)]
    quiet: bool,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
    /// Output machine readable JSON logs
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }

    async_main(settings)
}

#[tokio::main]
async fn async_main(settings: Settings) -> Result<()> {
    serve(settings).await
}

async fn serve(settings: Settings) -> Result<()> {
    let source = UpstreamClient::new(settings.upstream_url.as_str(), settings.fetch_timeout())
        .context("building upstream client")?;
    let relay = Arc::new(RelayService::new(Arc::new(source), &settings));
    Arc::clone(&relay).start().await;

    let state = AppState::new(relay.clone(), settings.clone());
    let app = api::create_router(state).context("building router")?;

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .context("invalid listen address")?;

    let listener = TcpListener::bind(addr).await.context("binding to address")?;

    info!("listening on http://{}", addr);

    // Set up graceful shutdown
    let relay_for_shutdown = relay.clone();
    let shutdown_signal = async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        info!("shutdown signal received, stopping poller...");
        relay_for_shutdown.stop().await;
        info!("shutdown complete");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("running server")?;

    Ok(())
}

fn init_logging(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    if cli.quiet {
        log::set_max_level(LevelFilter::Off);
        return;
    }

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chatrelay={level},tower_http={level}")));

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .ok();
    }

    // Also init env_logger for compatibility with log crate users
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.filter_level(match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });
    builder.try_init().ok();
}
