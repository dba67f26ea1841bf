use base64::{Engine as _, engine::general_purpose::STANDARD as base64_engine};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use lru::LruCache;
use resvg::usvg::fontdb;
use std::fs;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::AppError;

/// 构建字体数据库：可选系统字体 + 指定目录下的 .ttf/.otf。
///
/// 目录缺失或单个字体加载失败只记录日志，不阻断启动。
pub fn load_font_db(fonts_dir: Option<&Path>, include_system: bool) -> Arc<fontdb::Database> {
    let mut font_db = fontdb::Database::new();
    if include_system {
        font_db.load_system_fonts();
    }

    if let Some(dir) = fonts_dir {
        match fs::read_dir(dir) {
            Ok(entries) => {
                for path in entries.flatten().map(|e| e.path()) {
                    let is_font = path.is_file()
                        && path
                            .extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
                    if !is_font {
                        continue;
                    }
                    if let Err(e) = font_db.load_font_file(&path) {
                        tracing::error!("加载字体文件失败 '{}': {}", path.display(), e);
                    }
                }
            }
            Err(e) => tracing::warn!("读取字体目录失败 '{}': {}", dir.display(), e),
        }
    }

    tracing::info!("字体数据库就绪，共 {} 个字体", font_db.len());
    Arc::new(font_db)
}

/// 已缩放 Logo 的缓存容量（按目标尺寸区分）
const SCALED_LOGO_CACHE_SIZE: usize = 32;

type ScaledLogoKey = (u32, u32, bool);

/// 已解码的背景 Logo（启动时加载一次，渲染时按画布等比缩放）
#[derive(Debug)]
pub struct LogoImage {
    image: DynamicImage,
    scaled: Mutex<LruCache<ScaledLogoKey, String>>,
}

impl LogoImage {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let image = image::open(path).map_err(|e| {
            AppError::Internal(format!("加载 Logo 失败 '{}': {e}", path.display()))
        })?;
        Ok(Self::from_image(image))
    }

    pub fn from_image(image: DynamicImage) -> Self {
        let cap = NonZeroUsize::new(SCALED_LOGO_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            image,
            scaled: Mutex::new(LruCache::new(cap)),
        }
    }

    /// 等比缩放后完整落在 `width`×`height` 内的尺寸（每边至少 1px）。
    pub fn fit_size(&self, width: u32, height: u32) -> (u32, u32) {
        let (lw, lh) = (
            f64::from(self.image.width().max(1)),
            f64::from(self.image.height().max(1)),
        );
        let scale = (f64::from(width) / lw).min(f64::from(height) / lh);
        (
            ((lw * scale).round() as u32).clamp(1, width.max(1)),
            ((lh * scale).round() as u32).clamp(1, height.max(1)),
        )
    }

    /// 缩放到 `width`×`height` 并编码为 PNG Data URI，供 SVG `<image>` 引用。
    /// 结果按尺寸进入 LRU 缓存，同尺寸重复请求不再重新缩放。
    pub fn scaled_data_uri(&self, width: u32, height: u32, fast: bool) -> Result<String, AppError> {
        let key = (width, height, fast);
        if let Ok(mut cache) = self.scaled.lock()
            && let Some(uri) = cache.get(&key)
        {
            return Ok(uri.clone());
        }

        let filter = if fast {
            FilterType::Triangle
        } else {
            FilterType::Lanczos3
        };
        let scaled = DynamicImage::ImageRgba8(
            self.image.resize_exact(width, height, filter).to_rgba8(),
        );

        let mut out = Vec::new();
        scaled
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .map_err(|e| AppError::ImageRendererError(format!("Logo 编码失败: {e}")))?;
        let uri = format!("data:image/png;base64,{}", base64_engine.encode(out));

        if let Ok(mut cache) = self.scaled.lock() {
            cache.put(key, uri.clone());
        }
        Ok(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::{LogoImage, load_font_db};
    use image::{DynamicImage, RgbaImage};

    fn blank(width: u32, height: u32) -> LogoImage {
        LogoImage::from_image(DynamicImage::ImageRgba8(RgbaImage::new(width, height)))
    }

    #[test]
    fn fit_size_keeps_aspect_within_canvas() {
        assert_eq!(blank(200, 100).fit_size(800, 500), (800, 400));
        assert_eq!(blank(200, 100).fit_size(400, 100), (200, 100));
        assert_eq!(blank(200, 100).fit_size(1, 1), (1, 1));
    }

    #[test]
    fn tall_logo_is_bounded_by_canvas_height() {
        let (w, h) = blank(100, 1000).fit_size(4096, 400);
        assert_eq!((w, h), (40, 400));
    }

    #[test]
    fn data_uri_is_png() {
        let uri = blank(4, 2).scaled_data_uri(8, 4, true).expect("encode logo");
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn scaled_uri_is_cached_per_size() {
        let logo = blank(4, 2);
        let first = logo.scaled_data_uri(8, 4, true).expect("encode logo");
        let again = logo.scaled_data_uri(8, 4, true).expect("encode logo");
        assert_eq!(first, again);
        logo.scaled_data_uri(16, 8, true).expect("encode logo");
        assert_eq!(logo.scaled.lock().expect("cache lock").len(), 2);
    }

    #[test]
    fn missing_font_dir_yields_empty_db() {
        let db = load_font_db(Some(std::path::Path::new("./definitely/not/here")), false);
        assert_eq!(db.len(), 0);
    }
}
