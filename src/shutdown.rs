//! 优雅退出：等待 SIGINT/SIGTERM（Windows 下为 Ctrl+C）。

use tracing::{error, info};

/// 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
}

/// 等待第一个退出信号并返回原因。
///
/// 信号处理器注册失败时记录错误并退化为仅监听 Ctrl+C。
pub async fn wait_for_signal() -> ShutdownReason {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("接收到SIGINT信号 (Ctrl+C)");
                        return ShutdownReason::Interrupt;
                    }
                    _ = sigterm.recv() => {
                        info!("接收到SIGTERM信号");
                        return ShutdownReason::Terminate;
                    }
                }
            }
            Err(e) => error!("注册SIGTERM处理器失败: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("监听Ctrl+C信号失败: {}", e);
        // 无法监听信号时永不返回，交由进程管理器终止。
        std::future::pending::<()>().await;
    }
    info!("接收到Ctrl+C信号");
    ShutdownReason::Interrupt
}
