//! webcrud 示例网关
//!
//! 把内存中的 notes 资源通过 `add_crud_handlers` 挂到 axum 上

mod app;
mod auth;
mod notes;
mod routing;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing::info;
use webcrud_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 加载配置
    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir).context("Failed to load configuration")?;

    // 初始化 tracing
    if config.telemetry.json {
        webcrud_telemetry::init_tracing_json(&config.telemetry.log_level)?;
    } else {
        webcrud_telemetry::init_tracing(&config.telemetry.log_level)?;
    }

    let metrics = if config.telemetry.metrics {
        Some(webcrud_telemetry::init_metrics()?)
    } else {
        None
    };

    let mut router = app::build_app(&config, Arc::new(notes::NoteStore::new()))?;
    if let Some(handle) = metrics {
        router = router.merge(routing::metrics_routes(handle));
    }

    // 启动服务器
    let addr: SocketAddr = config
        .server
        .bind_addr()
        .parse()
        .context("Invalid server address")?;

    info!(%addr, app = %config.app_name, env = %config.app_env, "Starting gateway");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
