//! EmberKV - A Redis-Compatible RESP Server
//!
//! This is the main entry point for the EmberKV server.
//! It parses the configuration, sets up logging and runs the accept loop
//! until Ctrl+C.

use clap::Parser;
use emberkv::{Dispatcher, Server, ServerConfig};
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &ServerConfig) {
    println!(
        r#"
EmberKV v{} - Redis-Compatible RESP Server
──────────────────────────────────────────────────────────────
Server started on {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        emberkv::VERSION,
        config.bind_address()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = ServerConfig::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let dispatcher = Dispatcher::new();
    for cmd in dispatcher.registry().commands() {
        debug!(
            command = cmd.name,
            arity = cmd.arity,
            summary = cmd.summary,
            "Registered command"
        );
    }

    // Bind the TCP listener
    let server = Server::bind(&config).await?.with_dispatcher(dispatcher);
    let local_addr = server.local_addr()?;

    print_banner(&config);
    info!(
        addr = %local_addr,
        backlog = config.backlog,
        read_buffer_size = config.read_buffer_size,
        "Listening"
    );

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    server.run_until(shutdown).await;

    info!("Server shutdown complete");
    Ok(())
}
