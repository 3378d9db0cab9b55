//! Content-Length framed JSON-RPC 2.0 over the runtime's stdio

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::agents::error::{AgentError, Result};

const CONTENT_LENGTH: &str = "content-length";

/// A message read from the runtime
#[derive(Debug, PartialEq)]
pub(crate) enum Incoming {
    /// Answer to one of our requests
    Response {
        id: u64,
        outcome: std::result::Result<Value, String>,
    },
    /// Fire-and-forget message from the runtime
    Notification { method: String, params: Value },
    /// The runtime asking us for something (tool calls)
    Request {
        id: Value,
        method: String,
        params: Value,
    },
}

impl Incoming {
    pub(crate) fn classify(message: Value) -> Option<Self> {
        let method = message.get("method").and_then(Value::as_str).map(str::to_string);
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        match (method, message.get("id")) {
            (Some(method), Some(id)) if !id.is_null() => Some(Incoming::Request {
                id: id.clone(),
                method,
                params,
            }),
            (Some(method), _) => Some(Incoming::Notification { method, params }),
            (None, Some(id)) => {
                let id = id.as_u64()?;
                let outcome = match message.get("error") {
                    Some(error) if !error.is_null() => Err(error
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string())),
                    _ => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
                };
                Some(Incoming::Response { id, outcome })
            }
            (None, None) => None,
        }
    }
}

pub(crate) fn request(id: u64, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

pub(crate) fn response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub(crate) fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

/// Write one framed message
pub(crate) async fn write_frame<W>(writer: &mut W, message: &Value) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(message)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message; `Ok(None)` on a clean end of stream
pub(crate) async fn read_frame<R>(reader: &mut R) -> Result<Option<Value>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return if content_length.is_none() {
                Ok(None)
            } else {
                Err(AgentError::Transport("stream ended inside a frame header".to_string()))
            };
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }

        if let Some((name, value)) = trimmed.split_once(':') {
            if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
                let parsed = value.trim().parse::<usize>().map_err(|e| {
                    AgentError::Transport(format!("invalid Content-Length '{}': {}", value.trim(), e))
                })?;
                content_length = Some(parsed);
            }
        }
    }

    let length = content_length.unwrap_or_default();
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}
