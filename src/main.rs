//! mcp-chat binary entry point.

use mcp_chat::cli::Cli;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // stdout carries answers; logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if cli.server_script.is_none() {
        println!("Usage: mcp-chat <path_to_server_script>");
        return;
    }

    if let Err(e) = mcp_chat::cli::chat::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
