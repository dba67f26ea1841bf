use ayat_backend::config::AppConfig;
use ayat_backend::features::ayat::HttpAyatSource;
use ayat_backend::shutdown::wait_for_signal;
use ayat_backend::startup::run_startup_checks;
use ayat_backend::{AppState, create_app};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load config
    let config_result = AppConfig::init_global();

    let default_filter = match &config_result {
        Ok(()) => AppConfig::global().logging.level.clone(),
        Err(_) => "ayat_backend=info,tower_http=info".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    if let Err(e) = config_result {
        tracing::error!("Config init failed: {}", e);
        std::process::exit(1);
    }
    let config = AppConfig::global();

    // Run startup checks
    let assets = match run_startup_checks(config).await {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Startup checks failed: {}", e);
            std::process::exit(1);
        }
    };

    let source = match HttpAyatSource::from_config(&config.source) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("经文数据源 HTTP Client 初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    let renderer = assets.into_renderer(config);
    let app_state = AppState::new(source, renderer, config.image.clone());
    let app = create_app(app_state, config);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Ayat JSON: http://{}/ayat/json", addr);
    tracing::info!("Ayat image: http://{}/ayat/image?theme=dark", addr);
    tracing::info!("Source: {}", config.source.url);

    // 收到信号后停止接收新连接；超时后不再等待在途请求
    let shutdown_timeout = config.shutdown.timeout_duration();
    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();
    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = wait_for_signal().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅退出...", reason);
        let _ = signal_tx.send(());
    });

    let forced_deadline = async move {
        if signal_rx.await.is_ok() {
            tokio::time::sleep(shutdown_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        res = graceful => {
            if let Err(e) = res {
                tracing::error!("服务器运行错误: {}", e);
                std::process::exit(1);
            }
            tracing::info!("服务器已优雅关闭");
        }
        _ = forced_deadline => {
            tracing::warn!(
                "优雅退出超时（{}秒），强制退出",
                config.shutdown.timeout_secs
            );
        }
    }
}
