use agentfn::cli::Cli;
use agentfn::config::Settings;
use clap::Parser;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_cli_flags_override_config_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("agentfn.toml");
    fs::write(
        &path,
        r#"
[server]
host = "0.0.0.0"
port = 8080

[agent]
timeout_seconds = 45
agents_md = "docs/AGENTS.md"
"#,
    )?;

    let cli = Cli::try_parse_from([
        "agentfn",
        "--config",
        path.to_str().unwrap(),
        "--port",
        "9090",
        "--timeout",
        "10",
    ])?;
    let settings = Settings::new_with_cli(&cli)?;

    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 9090);
    assert_eq!(settings.agent.timeout_seconds, 10);
    assert_eq!(settings.agent.agents_md.to_str(), Some("docs/AGENTS.md"));

    Ok(())
}

#[test]
fn test_zero_timeout_is_rejected() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("agentfn.toml");
    fs::write(&path, "[agent]\nevent_buffer = 0\n")?;

    let cli = Cli::try_parse_from(["agentfn", "--config", path.to_str().unwrap(), "--timeout", "0"])?;
    assert!(Settings::new_with_cli(&cli).is_err());

    let cli = Cli::try_parse_from(["agentfn", "--config", path.to_str().unwrap()])?;
    let err = Settings::new_with_cli(&cli).unwrap_err();
    assert!(err.to_string().contains("event_buffer"));

    Ok(())
}

#[test]
fn test_invalid_config_file_is_an_error() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("agentfn.toml");
    fs::write(&path, "[server]\nport = \"not a number\"\n")?;

    let cli = Cli::try_parse_from(["agentfn", "--config", path.to_str().unwrap()])?;
    assert!(Settings::new_with_cli(&cli).is_err());

    Ok(())
}
