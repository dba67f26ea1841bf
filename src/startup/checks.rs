use resvg::usvg::fontdb;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::image::{CardRenderer, LogoImage, RenderOptions, load_font_db};

/// 启动期加载的渲染资源
pub struct StartupAssets {
    pub fonts: Arc<fontdb::Database>,
    pub logo: Option<LogoImage>,
}

impl StartupAssets {
    /// 组装卡片渲染器
    pub fn into_renderer(self, config: &AppConfig) -> CardRenderer {
        CardRenderer::new(self.fonts, self.logo, RenderOptions::from_config(config))
    }
}

/// 执行启动检查
///
/// 1. 检查并创建 public 文件夹
/// 2. 检查字体目录（仅告警）
/// 3. 加载字体库与 Logo
pub async fn run_startup_checks(config: &AppConfig) -> Result<StartupAssets, AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    ensure_public_folder(&config.public_path())?;
    ensure_font_resources(&config.fonts_path());

    let t_load = std::time::Instant::now();
    let fonts_dir = config.fonts_path();
    let logo_path = config.logo_path();
    // 系统字体扫描与图片解码都是阻塞操作
    let assets = tokio::task::spawn_blocking(move || StartupAssets {
        fonts: load_font_db(Some(&fonts_dir), true),
        logo: logo_path.as_deref().and_then(load_logo),
    })
    .await
    .map_err(|e| AppError::Internal(format!("启动资源加载任务失败: {e}")))?;
    tracing::info!("渲染资源加载完成: {}ms", t_load.elapsed().as_millis());

    tracing::info!("✅ 启动检查完成");
    Ok(assets)
}

/// 确保 public 文件夹存在
fn ensure_public_folder(public_path: &Path) -> Result<(), AppError> {
    if !public_path.exists() {
        tracing::warn!("📁 未找到 public 文件夹，正在创建: {:?}", public_path);
        fs::create_dir_all(public_path)
            .map_err(|e| AppError::Internal(format!("创建 public 文件夹失败: {e}")))?;
        tracing::info!("✅ public 文件夹创建成功");
    } else {
        tracing::info!("✅ public 文件夹已存在");
    }
    Ok(())
}

/// 字体目录中是否存在 .ttf/.otf
fn has_font_files(font_dir: &Path) -> bool {
    fs::read_dir(font_dir)
        .map(|entries| {
            entries.flatten().any(|e| {
                e.path()
                    .extension()
                    .and_then(|x| x.to_str())
                    .is_some_and(|x| x.eq_ignore_ascii_case("ttf") || x.eq_ignore_ascii_case("otf"))
            })
        })
        .unwrap_or(false)
}

fn ensure_font_resources(font_dir: &Path) {
    if has_font_files(font_dir) {
        tracing::info!("字体目录就绪: {:?}", font_dir);
    } else {
        tracing::warn!(
            "字体目录 {:?} 中未找到 .ttf/.otf，阿拉伯文将依赖系统字体",
            font_dir
        );
    }
}

/// 加载 Logo：文件缺失视为不绘制，解码失败仅告警。
fn load_logo(path: &Path) -> Option<LogoImage> {
    if !path.exists() {
        tracing::info!("未找到 Logo 文件 {:?}，卡片将不绘制背景 Logo", path);
        return None;
    }
    match LogoImage::open(path) {
        Ok(logo) => {
            tracing::info!("Logo 已加载: {:?}", path);
            Some(logo)
        }
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_public_folder, has_font_files, load_logo};
    use image::{DynamicImage, RgbaImage};

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("ayat-startup-{tag}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn public_folder_is_created() {
        let root = scratch_dir("public");
        let public = root.join("nested").join("public");
        ensure_public_folder(&public).expect("create public");
        assert!(public.is_dir());
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn font_detection_checks_extensions() {
        let dir = scratch_dir("fonts");
        assert!(!has_font_files(&dir));
        std::fs::write(dir.join("readme.txt"), b"x").expect("write");
        assert!(!has_font_files(&dir));
        std::fs::write(dir.join("Amiri-Regular.TTF"), b"x").expect("write");
        assert!(has_font_files(&dir));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn logo_is_optional() {
        let dir = scratch_dir("logo");
        assert!(load_logo(&dir.join("missing.png")).is_none());

        std::fs::write(dir.join("broken.png"), b"not a png").expect("write");
        assert!(load_logo(&dir.join("broken.png")).is_none());

        let path = dir.join("logo.png");
        DynamicImage::ImageRgba8(RgbaImage::new(8, 4))
            .save(&path)
            .expect("save logo");
        let logo = load_logo(&path).expect("logo loaded");
        assert_eq!(logo.fit_size(16, 16), (16, 8));
        let _ = std::fs::remove_dir_all(dir);
    }
}
