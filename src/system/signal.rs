use tokio::signal;
use tracing::{error, warn};

/// 等待 Ctrl+C（Unix 上还包括 SIGTERM）
pub async fn listen_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        let mut term = match unix_signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                wait_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = wait_ctrl_c() => {}
            _ = term.recv() => warn!("SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    wait_ctrl_c().await;
}

async fn wait_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => warn!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for Ctrl+C: {}", e);
            // 无法监听信号时不触发关闭
            std::future::pending::<()>().await;
        }
    }
}
