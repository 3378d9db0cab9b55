//! Session configuration sent to the runtime on create/resume

use std::collections::BTreeMap;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Tool definition advertised to the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool arguments
    pub parameters: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemMessageMode {
    Replace,
    Append,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub mode: SystemMessageMode,
    pub content: String,
}

impl SystemMessage {
    /// Replace the runtime's default system prompt entirely
    pub fn replace(content: impl Into<String>) -> Self {
        Self {
            mode: SystemMessageMode::Replace,
            content: content.into(),
        }
    }
}

/// An MCP server the runtime should connect to for extra tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpServerSpec {
    Local {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
        #[serde(default = "all_tools")]
        tools: Vec<String>,
    },
    Http {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<BTreeMap<String, String>>,
        #[serde(default = "all_tools")]
        tools: Vec<String>,
    },
    Sse {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<BTreeMap<String, String>>,
        #[serde(default = "all_tools")]
        tools: Vec<String>,
    },
}

/// Tool filter exposing every tool of a server
pub fn all_tools() -> Vec<String> {
    vec!["*".to_string()]
}

/// Model provider override used in BYOK mode
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: String,
    pub base_url: String,
    #[serde(serialize_with = "expose")]
    pub api_key: SecretString,
    pub wire_api: String,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl ProviderConfig {
    /// OpenAI-compatible endpoint; GPT-5 series models speak the responses API
    pub fn openai_compatible(base_url: impl Into<String>, api_key: SecretString, model: &str) -> Self {
        let wire_api = if model.starts_with("gpt-5") {
            "responses"
        } else {
            "completions"
        };
        Self {
            provider_type: "openai".to_string(),
            base_url: base_url.into(),
            api_key,
            wire_api: wire_api.to_string(),
        }
    }
}

/// Full configuration for creating a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub model: String,
    pub streaming: bool,
    pub tools: Vec<ToolSpec>,
    pub system_message: SystemMessage,
    /// Requested id; the runtime may honor or ignore it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub mcp_servers: BTreeMap<String, McpServerSpec>,
    /// Directory the runtime scans for skills
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderConfig>,
}

/// Configuration for reattaching to an existing session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSessionConfig {
    pub model: String,
    pub streaming: bool,
    pub tools: Vec<ToolSpec>,
    pub system_message: SystemMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub mcp_servers: BTreeMap<String, McpServerSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_api_selection() {
        let key = SecretString::from("k".to_string());
        assert_eq!(
            ProviderConfig::openai_compatible("https://x", key.clone(), "gpt-5-mini").wire_api,
            "responses"
        );
        assert_eq!(
            ProviderConfig::openai_compatible("https://x", key, "gpt-4o").wire_api,
            "completions"
        );
    }

    #[test]
    fn test_session_config_wire_shape() {
        let config = SessionConfig {
            model: "claude-sonnet-4".to_string(),
            streaming: true,
            tools: vec![],
            system_message: SystemMessage::replace("be brief"),
            session_id: Some("abc".to_string()),
            config_dir: None,
            mcp_servers: BTreeMap::new(),
            session_directory: None,
            provider: None,
        };

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["sessionId"], "abc");
        assert_eq!(value["systemMessage"], json!({"mode": "replace", "content": "be brief"}));
        assert!(value.get("mcpServers").is_none());
        assert!(value.get("provider").is_none());
    }

    #[test]
    fn test_mcp_server_spec_tagging() {
        let local = McpServerSpec::Local {
            command: "npx".to_string(),
            args: vec!["server".to_string()],
            env: BTreeMap::new(),
            tools: all_tools(),
        };
        let value = serde_json::to_value(&local).unwrap();
        assert_eq!(value["type"], "local");
        assert_eq!(value["tools"], json!(["*"]));
    }
}
