use anyhow::Context;
use clap::Parser;
use junction_gateway::admin::AdminServer;
use junction_gateway::config::Config;
use junction_gateway::engine::{Engine, GatewayServer};
use junction_gateway::proxy::create_http_client;
use junction_gateway::rules::{RuleSet, RuleStore};
use junction_gateway::trace::{LogSink, MemorySink, TraceRecorder};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "junction", about = "Declarative HTTP routing and transformation gateway")]
struct Args {
    /// Path to the gateway configuration file (YAML)
    #[arg(short, long, env = "JUNCTION_CONFIG")]
    config: Option<PathBuf>,
    /// Gateway listen address (overrides the config file)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
    /// Admin API listen address (overrides the config file)
    #[arg(long)]
    admin: Option<SocketAddr>,
    /// Rule-set document (YAML or JSON) to load at startup
    #[arg(short, long, env = "JUNCTION_RULES")]
    rules: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.listen.addr = listen;
    }
    if let Some(admin) = args.admin {
        config.admin.addr = admin;
    }
    if let Some(rules) = args.rules {
        config.rules_file = Some(rules);
    }
    config.validate()?;

    let store = Arc::new(RuleStore::new());
    if let Some(path) = &config.rules_file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rule set from {}", path.display()))?;
        // YAML is a superset of JSON, so one parser covers both formats.
        let rules: RuleSet = serde_yaml::from_str(&contents)
            .with_context(|| format!("invalid rule set in {}", path.display()))?;
        store.replace(rules);
    }

    let traces = Arc::new(MemorySink::new(config.trace_buffer));
    let recorder = TraceRecorder::new()
        .with_sink(traces.clone())
        .with_sink(Arc::new(LogSink));

    let client = create_http_client(&config.connection_pool);
    let engine = Arc::new(Engine::new(
        Arc::clone(&store),
        recorder,
        client,
        Duration::from_secs(config.upstream.timeout_secs),
    ));

    let (shutdown_tx, _) = broadcast::channel(1);

    let gateway = GatewayServer::bind(config.listen.addr, engine)
        .await
        .with_context(|| format!("failed to bind gateway listener on {}", config.listen.addr))?;
    let mut gateway_task = tokio::spawn(gateway.run(shutdown_tx.subscribe()));

    let admin = AdminServer::bind(config.admin.addr, store, traces)
        .await
        .with_context(|| format!("failed to bind admin listener on {}", config.admin.addr))?;
    let mut admin_task = tokio::spawn(admin.run(shutdown_tx.subscribe()));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
            gateway_task.await??;
            admin_task.await??;
        }
        result = &mut gateway_task => {
            result??;
            anyhow::bail!("gateway listener exited unexpectedly");
        }
        result = &mut admin_task => {
            result??;
            anyhow::bail!("admin listener exited unexpectedly");
        }
    }
    Ok(())
}
