//! JunoKV - A Multi-Database In-Memory Key-Value Store
//!
//! This is the main entry point for the JunoKV server.
//! It sets up the TCP listener, the database registry, and handles incoming connections.

use junokv::commands::CommandHandler;
use junokv::connection::{handle_connection, ConnectionStats};
use junokv::storage::{ExpiryConfig, Registry};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Pause between two expiry sweeps of a database
    sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: junokv::DEFAULT_HOST.to_string(),
            port: junokv::DEFAULT_PORT,
            sweep_interval: ExpiryConfig::default().interval,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    config.host = flag_value(&args, i, "--host").to_string();
                    i += 2;
                }
                "--port" | "-p" => {
                    config.port = flag_value(&args, i, "--port").parse().unwrap_or_else(|_| {
                        eprintln!("Error: invalid port number");
                        std::process::exit(1);
                    });
                    i += 2;
                }
                "--sweep-interval" => {
                    let ms: u64 = flag_value(&args, i, "--sweep-interval")
                        .parse()
                        .ok()
                        .filter(|ms| *ms > 0)
                        .unwrap_or_else(|| {
                            eprintln!("Error: --sweep-interval must be a positive number of milliseconds");
                            std::process::exit(1);
                        });
                    config.sweep_interval = Duration::from_millis(ms);
                    i += 2;
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("JunoKV version {}", junokv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Returns the value following the flag at `i`, or exits.
fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires a value", flag);
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        r#"
JunoKV - A Multi-Database In-Memory Key-Value Store

USAGE:
    junokv [OPTIONS]

OPTIONS:
    -h, --host <HOST>            Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>            Port to listen on (default: 8000)
        --sweep-interval <MS>    Pause between expiry sweeps (default: 250)
    -v, --version                Print version information
        --help                   Print this help message

LOGGING:
    Set RUST_LOG to change verbosity, e.g. RUST_LOG=junokv=debug

CONNECTING:
    Use any line-based client:
    $ nc 127.0.0.1 8000
    127.0.0.1:8000[0] set name "John Doe"
    OK
    127.0.0.1:8000[0] get name
    John Doe
    127.0.0.1:8000[0] select 1
    127.0.0.1:8000[1]
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    println!(
        "JunoKV v{} - listening on {}, Ctrl+C to shut down",
        junokv::VERSION,
        config.bind_address()
    );

    // The registry is shared across all connections
    let expiry = ExpiryConfig::default().with_interval(config.sweep_interval);
    let registry = Arc::new(Registry::new(expiry));
    info!(
        sweep_interval_ms = config.sweep_interval.as_millis() as u64,
        "Default database ready"
    );

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = accept_loop(listener, config.bind_address(), Arc::clone(&registry), stats) => {}
        _ = shutdown => {}
    }

    registry.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    server_addr: String,
    registry: Arc<Registry>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                // Each connection starts on the default database
                let handler = CommandHandler::new(Arc::clone(&registry));
                let stats = Arc::clone(&stats);
                let server_addr = server_addr.clone();

                tokio::spawn(async move {
                    handle_connection(stream, addr, server_addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
