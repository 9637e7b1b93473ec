//! Remote Executor Gateway
//!
//! Loads configuration, creates the sandbox root and serves `/api` until
//! interrupted. Any configuration problem is fatal before the listener binds.

use clap::Parser;
use remote_executor::config::{validate_config, Config, LogConfig, LogFormat};
use remote_executor::gateway::{build_router, prepare};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ---- CLI ----

#[derive(Parser)]
#[command(name = "remote-executor", version, about = "Sandboxed file and shell gateway")]
struct Args {
    /// Config file (JSON5 or TOML)
    #[arg(long, short, env = "REMOTE_EXECUTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    bind: Option<String>,

    /// Port
    #[arg(long, short)]
    port: Option<u16>,

    /// Sandbox root directory
    #[arg(long)]
    base_dir: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(bind) = self.bind {
            config.gateway.bind = bind;
        }
        if let Some(port) = self.port {
            config.gateway.port = Some(port);
        }
        if let Some(dir) = self.base_dir {
            config.sandbox.base_dir = Some(dir);
        }
    }
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_new(&log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

// ---- Main ----

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` may carry REMOTE_EXECUTOR_CONFIG, which clap reads
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);

    init_tracing(&config.log);

    let validation = validate_config(&config);
    for issue in &validation.warnings {
        warn!("{}", issue);
    }
    if !validation.valid {
        let errors: Vec<String> = validation.errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Invalid configuration:\n  {}", errors.join("\n  "));
    }

    let dispatcher = prepare(&config).await?;
    let root = dispatcher.root().path().to_path_buf();

    let app = build_router(dispatcher, config.gateway.body_limit_bytes);

    // Bind and serve
    let listener =
        tokio::net::TcpListener::bind((config.gateway.bind.as_str(), config.gateway.port())).await?;
    let addr: SocketAddr = listener.local_addr()?;

    info!("Remote executor v{} is running", remote_executor::VERSION);
    info!("Listening on: http://{}", addr);
    info!("Serving files in: {}", root.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
