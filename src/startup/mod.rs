/// 启动检查与渲染资源加载
pub mod checks;

pub use checks::{StartupAssets, run_startup_checks};
