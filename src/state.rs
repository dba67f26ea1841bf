use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::ImageRenderConfig;
use crate::features::ayat::AyatSource;
use crate::features::image::CardRenderer;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 经文数据源（生产为远端 HTTP，测试可替换）
    pub source: Arc<dyn AyatSource>,
    /// 卡片渲染器（字体库与 Logo 只在启动时加载一次）
    pub renderer: Arc<CardRenderer>,
    /// 卡片尺寸默认值与范围
    pub image: Arc<ImageRenderConfig>,
    /// 控制并发渲染的信号量（限制 CPU 密集型任务数量）
    pub render_semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn AyatSource>,
        renderer: CardRenderer,
        image: ImageRenderConfig,
    ) -> Self {
        let permits = image.parallelism();
        Self {
            source,
            renderer: Arc::new(renderer),
            image: Arc::new(image),
            render_semaphore: Arc::new(Semaphore::new(permits)),
        }
    }
}
