use anyhow::Context;

use biz_agent::config::{find_config_path, load_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let path = find_config_path(&cwd)?;
    let config = load_config(&path).with_context(|| format!("invalid config at {}", path.display()))?;

    biz_agent::init_tracing(&config.logging);
    tracing::info!(config = %path.display(), "configuration loaded");

    biz_agent::run(config).await
}
