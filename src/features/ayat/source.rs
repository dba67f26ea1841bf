use futures_util::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde_json::Value;
use std::time::Instant;

use super::models::VerseRecord;
use crate::config::SourceConfig;
use crate::error::SourceError;

/// 经文集合的数据源：每次调用完整读取一次集合。
///
/// 返回未解析的原始条目：JSON 接口原样输出被选中的条目，
/// 渲染前只解析被选中的那一条，单条坏数据不影响其它请求。
pub trait AyatSource: Send + Sync {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Value>, SourceError>>;
}

/// 远程 JSON 数据源（GET 返回经文数组）
pub struct HttpAyatSource {
    url: String,
    client: Client,
}

impl HttpAyatSource {
    pub fn new(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// 使用进程内共享的 Client。
    pub fn from_config(cfg: &SourceConfig) -> Result<Self, SourceError> {
        let client = crate::http::source_client(cfg.timeout_duration())?;
        Ok(Self::new(cfg.url.clone(), client.clone()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<Value>, SourceError> {
        let entries: Vec<Value> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if entries.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(entries)
    }
}

impl AyatSource for HttpAyatSource {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Value>, SourceError>> {
        async move {
            let t0 = Instant::now();
            let result = self.fetch().await;
            match &result {
                Ok(entries) => tracing::debug!(
                    "经文数据拉取完成: {} 条, 耗时 {:?}",
                    entries.len(),
                    t0.elapsed()
                ),
                Err(e) => tracing::error!("经文数据拉取失败 ({}): {}", self.url, e),
            }
            result
        }
        .boxed()
    }
}

/// 内存数据源：固定返回给定集合（测试、离线渲染使用）
#[derive(Debug, Clone, Default)]
pub struct StaticAyatSource {
    entries: Vec<Value>,
}

impl StaticAyatSource {
    pub fn new(entries: Vec<Value>) -> Self {
        Self { entries }
    }

    pub fn from_records(records: impl IntoIterator<Item = VerseRecord>) -> Self {
        Self::new(
            records
                .into_iter()
                .filter_map(|r| serde_json::to_value(r).ok())
                .collect(),
        )
    }

    /// 始终不可用的数据源
    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl AyatSource for StaticAyatSource {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<Value>, SourceError>> {
        let result = if self.entries.is_empty() {
            Err(SourceError::Empty)
        } else {
            Ok(self.entries.clone())
        };
        futures_util::future::ready(result).boxed()
    }
}
