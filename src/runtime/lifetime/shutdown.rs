use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::hits::HitCounter;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 单个任务超时时间（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C / SIGTERM，然后在超时内刷出缓冲中的点击计数
pub async fn listen_for_shutdown(hits: Option<HitCounter>) {
    wait_for_signal().await;

    let shutdown_result = timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        perform_shutdown_tasks(hits),
    )
    .await;

    match shutdown_result {
        Ok(()) => info!("All shutdown tasks completed successfully"),
        Err(_) => error!(
            "Shutdown tasks timed out after {} seconds, buffered hits may be lost",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal as unix_signal};

    let mut term = match unix_signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!("Failed to listen for SIGTERM: {}", e);
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = term.recv() => info!("SIGTERM received, flushing data..."),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, flushing data..."),
        Err(e) => warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        ),
    }
}

async fn perform_shutdown_tasks(hits: Option<HitCounter>) {
    let Some(counter) = hits else {
        info!("HitCounter is not initialized, skipping flush");
        return;
    };

    let pending = counter.buffer_size();
    match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), counter.flush()).await {
        Ok(()) => info!("HitCounter flushed ({} buffered hits)", pending),
        Err(_) => error!(
            "HitCounter flush timed out after {} seconds",
            TASK_TIMEOUT_SECS
        ),
    }
}
