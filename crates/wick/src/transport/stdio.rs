//! stdio Transport
//!
//! One JSON-RPC message per line on stdin, one reply per line on stdout.
//! Notifications get no reply. stdout carries nothing else; logs go to
//! stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::McpState;
use crate::protocol::{handle_text, Outcome};
use crate::Handler;

/// The single session a stdio pipe runs under.
pub const STDIO_SESSION: &str = "stdio";

/// Serve MCP over the process's stdin/stdout until EOF.
pub async fn serve_stdio<H: Handler>(state: Arc<McpState<H>>) -> std::io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve_lines(state, stdin, stdout).await
}

/// Serve newline-delimited JSON-RPC from `reader` to `writer` until EOF.
pub async fn serve_lines<H, R, W>(state: Arc<McpState<H>>, reader: R, mut writer: W) -> std::io::Result<()>
where
    H: Handler,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let session_id = state.sessions.get_or_create(Some(STDIO_SESSION));
    let mut lines = reader.lines();

    tracing::info!("stdio transport ready");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        state.sessions.touch(&session_id);
        let reply = match handle_text(&state, &session_id, line).await {
            Outcome::Reply(reply) | Outcome::Rejected(reply) => reply,
            Outcome::Notification => continue,
        };

        let mut encoded = serde_json::to_vec(&reply).map_err(std::io::Error::other)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
    }

    tracing::info!("stdin closed, stdio transport stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::tests::state;
    use serde_json::Value;

    async fn run(input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        serve_lines(state(), input.as_bytes(), &mut output).await.unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_reply_per_request() {
        let replies = run(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        ))
        .await;

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["id"], 2);
        assert!(replies[1]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let replies = run("this is not json\n").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0]["id"].is_null());
        assert_eq!(replies[0]["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_eof_without_trailing_newline() {
        let replies = run(r#"{"jsonrpc":"2.0","id":"last","method":"ping"}"#).await;
        assert_eq!(replies[0]["id"], "last");
    }
}
