use clap::Parser;
use std::path::PathBuf;

/// agentfn - HTTP, MCP and timer front end for a hosted agent runtime
#[derive(Parser, Debug, Clone)]
#[command(name = "agentfn", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "AGENTFN_CONFIG", default_value = "agentfn.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "AGENTFN_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "FUNCTIONS_CUSTOMHANDLER_PORT")]
    pub port: Option<u16>,

    /// Model requested for new sessions
    #[arg(long, env = "COPILOT_MODEL")]
    pub model: Option<String>,

    /// Run timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Path to the AGENTS.md document
    #[arg(long)]
    pub agents_md: Option<PathBuf>,

    /// Explicit path to the agent runtime binary
    #[arg(long, env = "COPILOT_CLI_PATH")]
    pub cli_path: Option<String>,

    /// Token the runtime authenticates with
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// BYOK endpoint (OpenAI compatible)
    #[arg(long, env = "AZURE_AI_FOUNDRY_ENDPOINT")]
    pub foundry_endpoint: Option<String>,

    /// BYOK API key
    #[arg(long, env = "AZURE_AI_FOUNDRY_API_KEY", hide_env_values = true)]
    pub foundry_api_key: Option<String>,

    /// BYOK deployment model
    #[arg(long, env = "AZURE_AI_FOUNDRY_MODEL")]
    pub foundry_model: Option<String>,

    /// Directory holding session state
    #[arg(long, env = "CODE_ASSISTANT_CONFIG_PATH")]
    pub session_config_path: Option<String>,

    /// Set in container deployments; selects the shared session directory
    #[arg(long, env = "CONTAINER_NAME")]
    pub container_name: Option<String>,

    /// Root directory scanned for skills
    #[arg(long, env = "COPILOT_SESSION_DIRECTORY")]
    pub session_directory: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["agentfn"]);
        assert_eq!(cli.config, PathBuf::from("agentfn.toml"));
        assert!(cli.timeout.is_none());
        assert!(cli.agents_md.is_none());
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "agentfn",
            "--config",
            "custom.toml",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--model",
            "gpt-5",
            "--timeout",
            "30",
            "--foundry-endpoint",
            "https://foundry.example",
            "--foundry-api-key",
            "secret",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.host, Some("0.0.0.0".to_string()));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.model, Some("gpt-5".to_string()));
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.foundry_endpoint.as_deref(), Some("https://foundry.example"));
        assert_eq!(cli.foundry_api_key.as_deref(), Some("secret"));
    }
}
