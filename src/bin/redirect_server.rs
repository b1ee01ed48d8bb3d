use anyhow::Context;
use clap::Parser;
use small_tools::server;
use small_tools::utils::{logger, validation::Validate};
use small_tools::{chain_handlers, DefaultHandler, Handler, LocalStorage, RedirectArgs, ServerConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = RedirectArgs::parse();

    let config = match ServerConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_server_logger(args.verbose, config.logging.json);
    tracing::debug!("Server config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let storage = LocalStorage::default();
    let tables = config
        .load_route_tables(&storage)
        .await
        .context("failed to build route tables")?;
    tracing::info!("Built redirect chain with {} stages", tables.len());

    let handler: Arc<dyn Handler> = Arc::from(chain_handlers(
        tables,
        Box::new(DefaultHandler::new(config.fallback.body.clone())),
    ));

    let addr = config.bind_addr()?;
    let listener = server::bind(addr).await?;
    tracing::info!("Starting the server on {}", addr);
    println!("Starting the server on {}", addr);

    server::serve(listener, handler, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
    .context("server loop failed")?;

    tracing::info!("Server stopped");
    Ok(())
}
