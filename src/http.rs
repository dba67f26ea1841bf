use once_cell::sync::OnceCell;
use reqwest::Client;
use std::time::Duration;

/// 经文数据源复用的 HTTP Client（统一连接池/Keep-Alive），避免每次请求重复创建。
///
/// 首次调用时的 timeout 生效；进程内只有一个数据源配置，因此不按 timeout 拆分。
static SOURCE_CLIENT: OnceCell<Client> = OnceCell::new();

const USER_AGENT: &str = concat!("ayat-backend/", env!("CARGO_PKG_VERSION"));

/// 获取数据源 Client。
pub fn source_client(timeout: Duration) -> Result<&'static Client, reqwest::Error> {
    SOURCE_CLIENT.get_or_try_init(|| build_client(timeout))
}

/// 构建一个独立的 Client（测试或 CLI 需要不同 timeout 时使用）。
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}
