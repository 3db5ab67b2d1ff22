use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use asterank_backend::config::BackendConfig;
use asterank_backend::handler::CommandHandler;
use asterank_backend::module::ephemeris::SbdbClient;
use asterank_backend::service::AsterankService;
use asterank_backend::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = BackendConfig::load_or_default(&config_path)?;

    let _logging_guard = asterank_backend::logging::init_logging(
        &config.log_dir,
        "asterank-backend",
        &config.log_level,
    )?;

    tracing::info!("Asterank backend starting...");
    tracing::info!("Loading catalogs from {}", config.data_dir);

    let store = MemoryStore::load_from_dir(&config.data_dir)
        .await
        .with_context(|| format!("Failed to load catalogs from {}", config.data_dir))?;
    let source = SbdbClient::new(&config.ephemeris)?;
    let service = AsterankService::new(Arc::new(store), Arc::new(source), config.max_limit);
    let handler = CommandHandler::new(Arc::new(service));

    tracing::info!("Reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = handler.handle_line(&line).await;
        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        stdout.flush().await?;
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}
