use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod error;
mod llm;
mod logging;
mod mcp;
mod sandbox;
mod transport;

#[derive(Parser)]
#[command(name = "sandbox-mcp")]
#[command(about = "MCP tool server: sandboxed file access and an LLM completion proxy")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.sandbox-mcp/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one request per TCP connection
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long, short)]
        port: Option<u16>,

        /// Sandbox root for file tools
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Serve newline-delimited requests on stdin/stdout
    Stdio {
        /// Sandbox root for file tools
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Print the tool registry
    Tools,

    /// Invoke a tool once and print the JSON-RPC response
    Call {
        /// Tool name (read_file, recursive_file_list, call_llm)
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,

        /// Sandbox root for file tools
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let mut config = config::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port, root } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(root) = root {
                config.sandbox.root = root;
            }
            tracing::info!("Sandbox root: {}", config.sandbox.root.display());

            let server = mcp::McpServer::new(&config)?;
            transport::serve_tcp(&server, &config.server).await?;
        }

        Commands::Stdio { root } => {
            if let Some(root) = root {
                config.sandbox.root = root;
            }
            let server = mcp::McpServer::new(&config)?;
            transport::serve_stdio(&server, &config.server).await?;
        }

        Commands::Tools => {
            let server = mcp::McpServer::new(&config)?;
            println!("{}", serde_json::to_string_pretty(server.tools())?);
        }

        Commands::Call { tool, args, root } => {
            if let Some(root) = root {
                config.sandbox.root = root;
            }
            run_call(&config, &tool, &args).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Init { force } => {
                init_config(cli.config.as_deref(), force)?;
            }
        },
    }

    Ok(())
}

async fn run_call(config: &config::Config, tool: &str, args: &str) -> Result<()> {
    let arguments: serde_json::Value =
        serde_json::from_str(args).context("--args must be a JSON object")?;

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {
            "name": tool,
            "arguments": arguments
        }
    });

    let server = mcp::McpServer::new(config)?;
    let response = server.handle_message(request.to_string().as_bytes()).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

fn init_config(path: Option<&std::path::Path>, force: bool) -> Result<()> {
    let target = match path {
        Some(p) => p.to_path_buf(),
        None => config::Config::config_path()?,
    };

    if target.exists() && !force {
        println!("Config already exists at {}", target.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    let written = config::Config::default().save(Some(target.as_path()))?;
    println!("✓ Created {}", written.display());

    Ok(())
}
