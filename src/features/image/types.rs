use serde::{Deserialize, Serialize};

use crate::config::ImageRenderConfig;
use crate::error::AppError;

use super::theme::DEFAULT_THEME;

/// 卡片方向：仅影响未指定 height 时的默认高度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardOrientation {
    #[default]
    Vertical,
    Horizontal,
}

impl CardOrientation {
    /// 解析 query 中的 `type`；无法识别的取值按 vertical 处理。
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("horizontal") => CardOrientation::Horizontal,
            _ => CardOrientation::Vertical,
        }
    }
}

/// `GET /ayat/image` 的 query 参数
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CardQuery {
    /// 主题名：dark/light/ocean/forest/sunset/royal/desert（未知值回退 dark）
    #[serde(default)]
    #[param(example = "dark")]
    pub theme: Option<String>,
    /// vertical | horizontal（默认 vertical，仅影响默认高度）
    #[serde(default, rename = "type")]
    #[param(example = "vertical")]
    pub kind: Option<String>,
    /// 画布宽度（默认 800）
    #[serde(default)]
    pub width: Option<u32>,
    /// 画布高度（默认 vertical=500 / horizontal=300）
    #[serde(default)]
    pub height: Option<u32>,
}

/// 已解析、校验过的渲染参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSpec {
    pub theme: String,
    pub width: u32,
    pub height: u32,
}

impl CardQuery {
    /// 填充默认值并校验尺寸范围。
    pub fn resolve(&self, cfg: &ImageRenderConfig) -> Result<CardSpec, AppError> {
        let orientation = CardOrientation::from_param(self.kind.as_deref());
        let width = self.width.unwrap_or(cfg.default_width);
        let height = self.height.unwrap_or(match orientation {
            CardOrientation::Vertical => cfg.vertical_height,
            CardOrientation::Horizontal => cfg.horizontal_height,
        });

        let (min, max) = (cfg.min_dimension, cfg.max_dimension);
        for (name, value) in [("width", width), ("height", height)] {
            if value < min || value > max {
                return Err(AppError::Validation(format!(
                    "{name} 必须在 {min}-{max} 范围内（当前 {value}）"
                )));
            }
        }

        let theme = self
            .theme
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_THEME)
            .to_string();

        Ok(CardSpec {
            theme,
            width,
            height,
        })
    }
}
