//! Wire adapters around [`McpServer`]
//!
//! TCP: one message per connection, answered and closed before the next
//! accept. Stdio: one message per line until EOF.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::mcp::McpServer;

/// Bind the configured address and serve connections one at a time, forever
pub async fn serve_tcp(server: &McpServer, config: &ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("MCP server listening on {}", listener.local_addr()?);

    loop {
        accept_one(server, &listener, config).await;
    }
}

/// Accept a single connection and answer it. Errors are logged, never fatal
pub async fn accept_one(server: &McpServer, listener: &TcpListener, config: &ServerConfig) {
    let (stream, peer) = match listener.accept().await {
        Ok(accepted) => accepted,
        Err(e) => {
            warn!("Accept failed: {}", e);
            return;
        }
    };

    info!("Connection from {}", peer);
    if let Err(e) = handle_connection(server, stream, config).await {
        warn!("Connection from {} failed: {:#}", peer, e);
    }
}

async fn handle_connection(server: &McpServer, mut stream: TcpStream, config: &ServerConfig) -> Result<()> {
    let read_timeout = Duration::from_secs(config.read_timeout_secs);
    let message = tokio::time::timeout(read_timeout, read_message(&mut stream, config.max_request_bytes))
        .await
        .context("Timed out reading request")?
        .context("Failed to read request")?;

    // peer closed without sending anything
    if message.trim_ascii().is_empty() {
        return Ok(());
    }

    let response = server.handle_message(&message).await;
    stream.write_all(response.to_line()?.as_bytes()).await?;
    stream.shutdown().await?;

    Ok(())
}

/// Read up to the first line break, never more than `max_bytes`
async fn read_message<R: AsyncRead + Unpin>(reader: R, max_bytes: usize) -> std::io::Result<Vec<u8>> {
    let mut reader = BufReader::new(reader.take(max_bytes as u64));
    let mut message = Vec::new();
    reader.read_until(b'\n', &mut message).await?;
    Ok(message)
}

/// Serve newline-delimited messages from stdin to stdout
pub async fn serve_stdio(server: &McpServer, config: &ServerConfig) -> Result<()> {
    info!("MCP server running on stdio");
    serve_lines(
        server,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        config.max_request_bytes,
    )
    .await
}

async fn serve_lines<R, W>(server: &McpServer, mut reader: R, mut writer: W, max_bytes: usize) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let mut line = Vec::new();
        let read = (&mut reader).take(max_bytes as u64).read_until(b'\n', &mut line).await?;
        if read == 0 {
            break;
        }

        // over the cap: answer the prefix, drop the rest of the line
        if read == max_bytes && !line.ends_with(b"\n") {
            warn!("Message exceeds {} bytes, truncated", max_bytes);
            discard_line(&mut reader).await?;
        }

        if line.trim_ascii().is_empty() {
            continue;
        }

        let response = server.handle_message(&line).await;
        writer.write_all(response.to_line()?.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Consume input up to and including the next line break
async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}
