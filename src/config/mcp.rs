//! Discovery of MCP servers handed to every session
//!
//! Reads the first existing `.vscode/mcp.json` or `mcp.json` under the
//! working directory. Entries with a `command` (or `type: local`) become
//! local servers; entries with a `url` (or `type: http|sse`) become remote
//! servers. Entries with an empty command or url are dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::agents::domain::McpServerSpec;

/// Candidate files, in priority order
pub fn candidate_files(root: &Path) -> [PathBuf; 2] {
    [root.join(".vscode").join("mcp.json"), root.join("mcp.json")]
}

/// Load MCP servers from the first readable candidate under `root`
pub fn load_mcp_servers(root: &Path) -> BTreeMap<String, McpServerSpec> {
    for path in candidate_files(root) {
        if !path.exists() {
            continue;
        }

        let data = match std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(anyhow::Error::from))
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read MCP config");
                continue;
            }
        };

        let servers = match data.get("servers") {
            None => return BTreeMap::new(),
            Some(Value::Object(servers)) => servers,
            Some(_) => {
                tracing::warn!(path = %path.display(), "Invalid MCP config: 'servers' must be an object");
                return BTreeMap::new();
            }
        };

        let parsed: BTreeMap<String, McpServerSpec> = servers
            .iter()
            .filter_map(|(name, entry)| {
                let entry = entry.as_object()?;
                parse_server(entry).map(|spec| (name.clone(), spec))
            })
            .collect();

        if parsed.is_empty() {
            tracing::info!(path = %path.display(), "No valid MCP servers found");
        } else {
            tracing::info!(path = %path.display(), count = parsed.len(), "Loaded MCP servers");
        }
        return parsed;
    }

    BTreeMap::new()
}

fn parse_server(entry: &Map<String, Value>) -> Option<McpServerSpec> {
    let server_type = entry
        .get("type")
        .map(|t| match t {
            Value::String(s) => s.to_lowercase(),
            other => other.to_string().to_lowercase(),
        })
        .unwrap_or_default();
    let tools = string_list(entry.get("tools"));

    if entry.contains_key("command") || server_type == "local" {
        let command = entry.get("command").map(display_string).unwrap_or_default();
        if command.is_empty() {
            return None;
        }
        return Some(McpServerSpec::Local {
            command,
            args: string_list(entry.get("args")).unwrap_or_default(),
            env: entry
                .get("env")
                .and_then(Value::as_object)
                .map(|env| {
                    env.iter()
                        .map(|(k, v)| (k.clone(), display_string(v)))
                        .collect()
                })
                .unwrap_or_default(),
            tools: tools.unwrap_or_else(crate::agents::domain::all_tools),
        });
    }

    if entry.contains_key("url") || server_type == "http" || server_type == "sse" {
        let url = entry.get("url").map(display_string).unwrap_or_default();
        if url.is_empty() {
            return None;
        }
        let headers = entry.get("headers").and_then(Value::as_object).map(|h| {
            h.iter()
                .map(|(k, v)| (k.clone(), display_string(v)))
                .collect::<BTreeMap<_, _>>()
        });
        let tools = tools.unwrap_or_else(crate::agents::domain::all_tools);
        return Some(if server_type == "sse" {
            McpServerSpec::Sse { url, headers, tools }
        } else {
            McpServerSpec::Http { url, headers, tools }
        });
    }

    None
}

fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(display_string).collect())
}
