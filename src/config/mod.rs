use std::path::{Component, Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

pub mod agents_md;
pub mod cli_path;
pub mod mcp;
pub mod skills;

pub use agents_md::{AgentsDocument, FunctionDefinition};

use crate::cli::Cli;

/// Fallback model when neither the settings file nor `COPILOT_MODEL` set one
pub const DEFAULT_MODEL: &str = "claude-sonnet-4";

/// Session state directory used in container deployments
pub const REMOTE_CONFIG_DIR: &str = "/code-assistant-session";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub agent: AgentSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentSettings {
    pub model: String,
    /// Deadline for one run, buffered or streaming
    pub timeout_seconds: u64,
    /// Capacity of each run's event subscription
    pub event_buffer: usize,
    /// Document providing the system message and timer definitions
    pub agents_md: PathBuf,
    /// Deployment root searched for the bundled runtime binary
    pub app_root: PathBuf,
    /// Log level handed to the runtime process
    pub log_level: String,
}

impl Settings {
    /// Load defaults, then the settings file (optional), then CLI/env overrides
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        if settings.agent.timeout_seconds == 0 {
            anyhow::bail!("agent.timeout_seconds must be greater than zero");
        }
        if settings.agent.event_buffer == 0 {
            anyhow::bail!("agent.event_buffer must be greater than zero");
        }

        Ok(settings)
    }

    /// Load the settings file at `path` over the built-in defaults
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 7071)?
            .set_default("agent.model", DEFAULT_MODEL)?
            .set_default("agent.timeout_seconds", 120)?
            .set_default("agent.event_buffer", 256)?
            .set_default("agent.agents_md", "AGENTS.md")?
            .set_default("agent.app_root", "/home/site/wwwroot")?
            .set_default("agent.log_level", "info")?
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(model) = cli.model.as_ref().filter(|m| !m.trim().is_empty()) {
            self.agent.model = model.clone();
        }
        if let Some(timeout) = cli.timeout {
            self.agent.timeout_seconds = timeout;
        }
        if let Some(agents_md) = &cli.agents_md {
            self.agent.agents_md = agents_md.clone();
        }
    }
}

/// Where the runtime should keep session state
///
/// An explicit path wins; a container deployment uses the mounted share;
/// otherwise `None` leaves the runtime on its own default (`~/.copilot`).
pub fn resolve_config_dir(explicit: Option<&str>, container_name: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        tracing::info!(config_dir = %path, "Using explicit session config directory");
        return Some(PathBuf::from(path));
    }

    if let Some(container) = container_name.filter(|c| !c.is_empty()) {
        tracing::info!(container = %container, config_dir = REMOTE_CONFIG_DIR, "Remote mode session config directory");
        return Some(PathBuf::from(REMOTE_CONFIG_DIR));
    }

    tracing::info!("No session config override, using runtime default");
    None
}

/// The runtime's own default config directory
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".copilot")
}

/// Whether `{config_dir}/session-state/{session_id}/` exists as a directory
///
/// Ids that are not a single plain path component never exist.
pub fn session_exists(config_dir: Option<&Path>, session_id: &str) -> bool {
    let mut components = Path::new(session_id).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain {
        tracing::warn!(session_id = %session_id, "Rejected malformed session id");
        return false;
    }

    let base = config_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_dir);
    let path = base.join("session-state").join(session_id);
    let exists = path.is_dir();
    tracing::debug!(session_id = %session_id, path = %path.display(), exists, "Checked session state");
    exists
}

/// Expand a leading `~` to the home directory
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_config_dir_priority() {
        assert_eq!(
            resolve_config_dir(Some("/data/sessions"), Some("worker")),
            Some(PathBuf::from("/data/sessions"))
        );
        assert_eq!(
            resolve_config_dir(None, Some("worker")),
            Some(PathBuf::from(REMOTE_CONFIG_DIR))
        );
        assert_eq!(resolve_config_dir(Some(""), None), None);
        assert_eq!(resolve_config_dir(None, None), None);
    }

    #[test]
    fn test_session_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("session-state").join("abc")).unwrap();
        std::fs::write(dir.path().join("session-state").join("file-only"), "x").unwrap();

        assert!(session_exists(Some(dir.path()), "abc"));
        assert!(!session_exists(Some(dir.path()), "missing"));
        assert!(!session_exists(Some(dir.path()), "file-only"));
        assert!(!session_exists(Some(dir.path()), "../session-state"));
        assert!(!session_exists(Some(dir.path()), "abc/../abc"));
    }

    #[test]
    fn test_load_defaults_without_file() {
        let settings = Settings::load(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 7071);
        assert_eq!(settings.agent.model, DEFAULT_MODEL);
        assert_eq!(settings.agent.timeout_seconds, 120);
        assert_eq!(settings.agent.event_buffer, 256);
        assert_eq!(settings.agent.agents_md, PathBuf::from("AGENTS.md"));
    }

    #[test]
    fn test_load_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentfn.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9000\n\n[agent]\nmodel = \"gpt-5\"\ntimeout_seconds = 30\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.agent.model, "gpt-5");
        assert_eq!(settings.agent.timeout_seconds, 30);
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("~user"), PathBuf::from("~user"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/skills"), home.join("skills"));
        }
    }
}
