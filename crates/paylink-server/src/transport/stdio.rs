//! Single-session transport: newline-delimited JSON-RPC on stdin/stdout.
//!
//! Messages are handled one at a time, in arrival order. stdout carries
//! nothing but replies.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::mcp::{McpService, ScopeBinder};

/// Serve until `reader` reaches EOF
pub async fn serve_lines<R, W>(
    service: &McpService,
    binder: &dyn ScopeBinder,
    reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(reply) = service.handle_text(line, binder).await else {
            continue;
        };

        let mut out = serde_json::to_vec(&reply)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
        debug!(bytes = out.len(), "reply written");
    }

    info!("stdin closed, shutting down");
    Ok(())
}

/// Serve the process's own stdin/stdout
pub async fn serve_stdio(service: &McpService, binder: &dyn ScopeBinder) -> std::io::Result<()> {
    info!("Serving MCP over stdio");
    serve_lines(service, binder, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
