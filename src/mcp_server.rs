//! sandbox-mcp stdio server
//!
//! Serves the same tools as `sandbox-mcp serve`, but over stdin/stdout, one
//! JSON-RPC message per line.

use anyhow::Result;

// parts of these modules are only reached from the CLI binary
#[allow(dead_code)]
mod config;
mod error;
mod llm;
mod logging;
#[allow(dead_code)]
mod mcp;
mod sandbox;
#[allow(dead_code)]
mod transport;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config_path = std::env::var_os("SANDBOX_MCP_CONFIG").map(std::path::PathBuf::from);
    let config = config::Config::load(config_path.as_deref())?;
    let server = mcp::McpServer::new(&config)?;

    transport::serve_stdio(&server, &config.server).await
}
