/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// 启动检查模块
pub mod startup;

/// 功能聚合模块
pub mod features;

/// 应用状态聚合模块
pub mod state;

/// 路由与中间件组装
pub mod app;

/// OpenAPI 文档
pub mod openapi;

/// 优雅退出信号
pub mod shutdown;

/// HTTP Client 复用工具
pub mod http;

/// 请求追踪 ID 中间件
pub mod request_id;

/// CORS 配置转换
pub mod cors;

// 导出常用类型供外部使用
pub use app::create_app;
pub use config::AppConfig;
pub use error::AppError;
pub use shutdown::ShutdownReason;
pub use state::AppState;
