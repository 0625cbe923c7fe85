//! Stripe Invoice MCP Server - Rust Implementation
//!
//! A Model Context Protocol (MCP) server for Stripe billing.
//! Provides tools for searching invoices by metadata and issuing credit notes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use stripe_invoice_mcp_server::config::Config;
use stripe_invoice_mcp_server::mcp::server::McpServer;
use stripe_invoice_mcp_server::mcp::tools::ToolRegistry;
use stripe_invoice_mcp_server::stripe::client::StripeClient;

/// Stripe Invoice MCP Server
#[derive(Parser)]
#[command(name = "stripe-invoice-mcp-server")]
#[command(author, version, about = "Stripe Invoice MCP Server - A Model Context Protocol server for Stripe invoices")]
struct Cli {
    /// Override the Stripe API base URL (e.g. a local stripe-mock)
    #[arg(long)]
    api_base: Option<String>,

    /// Override the Stripe request timeout, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for protocol messages
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Fail fast before serving anything if the credential is missing
    let mut config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Set STRIPE_SECRET_KEY to a Stripe secret key before starting the server.");
            std::process::exit(1);
        }
    };

    if let Some(api_base) = cli.api_base {
        config = config.with_api_base(api_base);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    tracing::info!(api_base = %config.api_base, "Starting Stripe invoice MCP server");

    let client = StripeClient::new(&config).context("failed to build Stripe HTTP client")?;
    let registry = ToolRegistry::new(Arc::new(client));

    let mut server = McpServer::new(registry);
    server
        .run_stdio()
        .await
        .context("MCP stdio transport failed")?;

    Ok(())
}
