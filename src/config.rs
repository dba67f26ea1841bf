use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 配置文件路径的环境变量覆盖
const CONFIG_PATH_ENV: &str = "APP_CONFIG";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API 路由前缀（业务路由同时挂载在根路径与该前缀下）
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
        }
    }
}

/// 经文数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 远端 JSON 地址（返回经文数组）
    #[serde(default = "SourceConfig::default_url")]
    pub url: String,
    /// 请求超时（秒）
    #[serde(default = "SourceConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl SourceConfig {
    fn default_url() -> String {
        "https://quran-ayat-json.vercel.app/".to_string()
    }
    fn default_timeout() -> u64 {
        30
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 静态资源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// 对外提供静态访问的目录（字体、Logo 等）
    #[serde(default = "ResourcesConfig::default_public_dir")]
    pub public_dir: String,
    /// 渲染时额外加载的字体目录（.ttf/.otf）
    #[serde(default = "ResourcesConfig::default_fonts_dir")]
    pub fonts_dir: String,
    /// 卡片背景 Logo（文件不存在时不绘制）
    #[serde(default = "ResourcesConfig::default_logo_path")]
    pub logo_path: Option<String>,
}

impl ResourcesConfig {
    fn default_public_dir() -> String {
        "./public".to_string()
    }
    fn default_fonts_dir() -> String {
        "./public/fonts".to_string()
    }
    fn default_logo_path() -> Option<String> {
        Some("./public/logo.png".to_string())
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            public_dir: Self::default_public_dir(),
            fonts_dir: Self::default_fonts_dir(),
            logo_path: Self::default_logo_path(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 未设置 RUST_LOG 时使用的过滤规则
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "ayat_backend=info,tower_http=info".to_string(),
        }
    }
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default)]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_headers: Vec<String>,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: Vec::new(),
            allowed_methods: vec!["GET".to_string()],
            allowed_headers: Vec::new(),
            max_age_secs: None,
        }
    }
}

/// 卡片页脚文字（自上而下字号递减，留空则跳过该行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    #[serde(default = "BrandingConfig::default_title")]
    pub title: String,
    #[serde(default = "BrandingConfig::default_attribution")]
    pub attribution: String,
    #[serde(default)]
    pub dedication: String,
}

impl BrandingConfig {
    fn default_title() -> String {
        "Quran & Sunnah".to_string()
    }
    fn default_attribution() -> String {
        "quran-ayat-json.vercel.app".to_string()
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            attribution: Self::default_attribution(),
            dedication: String::new(),
        }
    }
}

/// 图片渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRenderConfig {
    /// 未指定 width 时的默认宽度
    #[serde(default = "ImageRenderConfig::default_width")]
    pub default_width: u32,
    /// type=vertical 且未指定 height 时的默认高度
    #[serde(default = "ImageRenderConfig::default_vertical_height")]
    pub vertical_height: u32,
    /// type=horizontal 且未指定 height 时的默认高度
    #[serde(default = "ImageRenderConfig::default_horizontal_height")]
    pub horizontal_height: u32,
    /// 允许的最小边长（像素）
    #[serde(default = "ImageRenderConfig::default_min_dimension")]
    pub min_dimension: u32,
    /// 允许的最大边长（像素）
    #[serde(default = "ImageRenderConfig::default_max_dimension")]
    pub max_dimension: u32,
    /// 每行最多单词数（0=按画布宽度自动计算）
    #[serde(default)]
    pub words_per_line: usize,
    /// 渲染使用的字体族（CSS font-family 语法）
    #[serde(default = "ImageRenderConfig::default_font_family")]
    pub font_family: String,
    /// 背景 Logo 不透明度（0-1）
    #[serde(default = "ImageRenderConfig::default_logo_opacity")]
    pub logo_opacity: f32,
    /// 是否优先速度渲染（OptimizeSpeed），提升栅格化性能，可能略降画质
    #[serde(default)]
    pub optimize_speed: bool,
    /// 并发渲染许可数（0=自动，取 CPU 核心数）
    #[serde(default)]
    pub max_parallel: u32,
}

impl ImageRenderConfig {
    fn default_width() -> u32 {
        800
    }
    fn default_vertical_height() -> u32 {
        500
    }
    fn default_horizontal_height() -> u32 {
        300
    }
    fn default_min_dimension() -> u32 {
        50
    }
    fn default_max_dimension() -> u32 {
        4096
    }
    fn default_font_family() -> String {
        "Amiri, Noto Naskh Arabic, Noto Sans, DejaVu Sans, sans-serif".to_string()
    }
    fn default_logo_opacity() -> f32 {
        0.12
    }

    /// 实际使用的渲染并发数
    pub fn parallelism(&self) -> usize {
        match self.max_parallel {
            0 => num_cpus::get().max(1),
            n => n as usize,
        }
    }
}

impl Default for ImageRenderConfig {
    fn default() -> Self {
        Self {
            default_width: Self::default_width(),
            vertical_height: Self::default_vertical_height(),
            horizontal_height: Self::default_horizontal_height(),
            min_dimension: Self::default_min_dimension(),
            max_dimension: Self::default_max_dimension(),
            words_per_line: 0,
            font_family: Self::default_font_family(),
            logo_opacity: Self::default_logo_opacity(),
            optimize_speed: false,
            max_parallel: 0,
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 收到退出信号后等待在途请求完成的最长时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        15
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// 经文数据源
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    /// 页脚文字
    #[serde(default)]
    pub branding: BrandingConfig,
    /// 图片渲染配置
    #[serde(default)]
    pub image: ImageRenderConfig,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置（文件可缺省），支持环境变量覆盖
    ///
    /// 环境变量示例：`APP_SOURCE__URL`、`APP_IMAGE__DEFAULT_WIDTH`。
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        let builder = ConfigBuilder::builder()
            .add_source(File::from(config_path.as_path()).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = builder.try_deserialize()?;

        tracing::debug!(
            "配置加载完成: source = {}, api.prefix = {}",
            config.source.url,
            config.api.prefix
        );

        Ok(config)
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    fn get_config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn public_path(&self) -> PathBuf {
        PathBuf::from(&self.resources.public_dir)
    }

    pub fn fonts_path(&self) -> PathBuf {
        PathBuf::from(&self.resources.fonts_dir)
    }

    /// Logo 路径（未配置或为空字符串时返回 None）
    pub fn logo_path(&self) -> Option<PathBuf> {
        self.resources
            .logo_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}
