use agentfn::agents::runtime::{AuthMode, ClientOptions, CliConnector};
use agentfn::agents::{ClientManager, RunnerSettings, SessionRunner};
use agentfn::cli::Cli;
use agentfn::config::{self, cli_path, mcp, skills, AgentsDocument, Settings};
use agentfn::scheduler::{timer_specs, TimerScheduler};
use agentfn::tools::ToolRegistry;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;
    let host = settings.server.host.clone();
    let port = settings.server.port;

    info!("Starting agentfn on {}:{}", host, port);

    let cwd = std::env::current_dir()?;

    // Runtime client singleton
    let auth = AuthMode::resolve(
        cli.github_token.clone(),
        cli.foundry_endpoint.clone(),
        cli.foundry_api_key.clone(),
        cli.foundry_model.clone(),
    );
    let options = ClientOptions {
        cli_path: cli_path::resolve_cli_path(cli.cli_path.as_deref(), &settings.agent.app_root),
        auth,
        working_dir: Some(cwd.clone()),
        log_level: settings.agent.log_level.clone(),
    };
    let registry = Arc::new(ToolRegistry::builtin());
    let tools = registry.specs();
    let clients = Arc::new(ClientManager::new(
        Arc::new(CliConnector::new(registry)),
        options,
    ));

    // Session runner
    let document = AgentsDocument::load(&settings.agent.agents_md);
    let runner_settings = RunnerSettings {
        model: settings.agent.model.clone(),
        timeout: Duration::from_secs(settings.agent.timeout_seconds),
        event_buffer: settings.agent.event_buffer,
        config_dir: config::resolve_config_dir(
            cli.session_config_path.as_deref(),
            cli.container_name.as_deref(),
        ),
        session_directory: skills::resolve_session_directory(
            cli.session_directory.as_deref(),
            &cwd,
        ),
        system_message: document.body.clone(),
        mcp_servers: mcp::load_mcp_servers(&cwd),
    };
    let runner = Arc::new(SessionRunner::new(clients.clone(), tools, runner_settings));

    // Timer triggers
    let mut scheduler = TimerScheduler::new(runner.clone());
    for spec in timer_specs(&document.functions) {
        let name = spec.name.clone();
        if let Err(e) = scheduler.register_timer(spec) {
            warn!(timer = %name, error = %e, "Failed to register timer");
        }
    }
    scheduler.start();

    let app = agentfn::create_app(runner);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    clients.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
