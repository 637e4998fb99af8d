use tracing::info;

use automation_web::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = ServerConfig::from_env();
    info!(
        "Starting automation server on http://{} (project root: {}, timeout: {}s)",
        cfg.addr,
        cfg.runner.project_root.display(),
        cfg.runner.timeout.as_secs()
    );

    automation_web::serve(cfg).await
}
