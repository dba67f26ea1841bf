use resvg::usvg::{self, Options as UsvgOptions, fontdb};
use resvg::{
    render,
    tiny_skia::{Pixmap, Transform},
};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;

use super::assets::LogoImage;
use super::theme::{Palette, resolve_palette};
use super::types::CardSpec;
use super::wrap::{auto_words_per_line, estimate_text_width, wrap_words_within};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::ayat::models::VerseRecord;

// 版式常量
const BORDER_THICKNESS: f32 = 10.0;
const SECTION_MARGIN: f32 = 20.0;
const LINE_SPACING: f32 = 1.4;
const MIN_FONT_SIZE: f32 = 8.0;

// 各区块字号相对基准字号的比例
const ARABIC_SCALE: f32 = 1.0;
const ENGLISH_SCALE: f32 = 0.7;
const CITATION_SCALE: f32 = 0.55;
const HADITH_ARABIC_SCALE: f32 = 0.75;
const HADITH_ENGLISH_SCALE: f32 = 0.6;
const FOOTER_SCALES: [f32; 3] = [0.6, 0.5, 0.42];

/// 页脚三行：标题、出处、题献
#[derive(Debug, Clone, Default)]
pub struct FooterLines {
    pub title: String,
    pub attribution: String,
    pub dedication: String,
}

/// 渲染选项（进程内不变）
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub font_family: String,
    /// 每行最多单词数，0 表示按画布宽度自动计算
    pub words_per_line: usize,
    pub logo_opacity: f32,
    pub optimize_speed: bool,
    pub footer: FooterLines,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl RenderOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        let img = &config.image;
        Self {
            font_family: img.font_family.clone(),
            words_per_line: img.words_per_line,
            logo_opacity: img.logo_opacity.clamp(0.0, 1.0),
            optimize_speed: img.optimize_speed,
            footer: FooterLines {
                title: config.branding.title.clone(),
                attribution: config.branding.attribution.clone(),
                dedication: config.branding.dedication.clone(),
            },
        }
    }

    fn words_for(&self, width: u32) -> usize {
        match self.words_per_line {
            0 => auto_words_per_line(width),
            n => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_svg(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// 文本行所属区块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Arabic,
    English,
    Citation,
    HadithArabic,
    HadithEnglish,
    Footer,
}

/// 一行已定位的文本（y 为基线）
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub role: TextRole,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub anchor: Anchor,
    /// 可用行宽，估算超出时由 `textLength` 压缩
    pub max_width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogoPlacement {
    pub x: f32,
    pub y: f32,
    pub width: u32,
    pub height: u32,
}

/// 卡片版式计算结果
#[derive(Debug, Clone)]
pub struct CardLayout {
    pub width: u32,
    pub height: u32,
    pub font_size: f32,
    pub border: f32,
    pub runs: Vec<TextRun>,
    pub logo: Option<LogoPlacement>,
}

/// 基准字号：随画布尺寸等比变化。
pub fn base_font_size(width: u32, height: u32) -> f32 {
    (width as f32 / 30.0)
        .min(height as f32 / 20.0)
        .max(MIN_FONT_SIZE)
}

fn border_thickness(width: u32, height: u32) -> f32 {
    BORDER_THICKNESS
        .min((width.min(height) as f32 / 10.0).floor())
        .max(1.0)
}

/// 自上而下逐行排布文本的游标
struct Cursor<'a> {
    y: f32,
    words: usize,
    max_width: f32,
    runs: &'a mut Vec<TextRun>,
}

impl Cursor<'_> {
    fn line(&mut self, role: TextRole, text: String, x: f32, size: f32, anchor: Anchor) {
        let baseline = self.y + size;
        self.runs.push(TextRun {
            role,
            text,
            x,
            y: baseline,
            size,
            anchor,
            max_width: self.max_width,
        });
        self.y = baseline + size * (LINE_SPACING - 1.0);
    }

    fn wrapped(&mut self, role: TextRole, text: &str, x: f32, size: f32, anchor: Anchor) {
        let before = self.runs.len();
        for line in wrap_words_within(text, self.words, self.max_width, size) {
            self.line(role, line, x, size, anchor);
        }
        if self.runs.len() > before {
            self.y += SECTION_MARGIN;
        }
    }
}

/// 计算各区块位置：经文（阿语右对齐）→ 译文（左对齐）→ 出处 → 可选圣训 → 底部居中页脚。
///
/// `logo_size` 为 Logo 等比缩放后的尺寸，None 表示不绘制 Logo。
pub fn layout_card(
    record: &VerseRecord,
    width: u32,
    height: u32,
    options: &RenderOptions,
    logo_size: Option<(u32, u32)>,
) -> CardLayout {
    let font_size = base_font_size(width, height);
    let border = border_thickness(width, height);
    let padding = border + font_size * 0.8;
    let (w, h) = (width as f32, height as f32);
    let (left, right, center) = (padding, w - padding, w / 2.0);

    let mut runs = Vec::new();
    let mut cursor = Cursor {
        y: border + SECTION_MARGIN * 0.5,
        words: options.words_for(width),
        max_width: (right - left).max(1.0),
        runs: &mut runs,
    };

    cursor.wrapped(
        TextRole::Arabic,
        &record.text.arabic,
        right,
        font_size * ARABIC_SCALE,
        Anchor::End,
    );
    cursor.wrapped(
        TextRole::English,
        &record.text.english,
        left,
        font_size * ENGLISH_SCALE,
        Anchor::Start,
    );
    cursor.line(
        TextRole::Citation,
        record.citation(),
        left,
        font_size * CITATION_SCALE,
        Anchor::Start,
    );
    cursor.y += SECTION_MARGIN;

    if let Some(hadith) = &record.hadith {
        cursor.wrapped(
            TextRole::HadithArabic,
            &hadith.arabic,
            right,
            font_size * HADITH_ARABIC_SCALE,
            Anchor::End,
        );
        cursor.wrapped(
            TextRole::HadithEnglish,
            &hadith.english,
            left,
            font_size * HADITH_ENGLISH_SCALE,
            Anchor::Start,
        );
    }

    // 页脚贴底：先算总高度再回推起点
    let footer = &options.footer;
    let footer_lines: Vec<(&str, f32)> = [&footer.title, &footer.attribution, &footer.dedication]
        .into_iter()
        .zip(FOOTER_SCALES)
        .map(|(text, scale)| (text.trim(), font_size * scale))
        .filter(|(text, _)| !text.is_empty())
        .collect();
    let footer_height: f32 = footer_lines
        .iter()
        .map(|(_, size)| size * LINE_SPACING)
        .sum();
    cursor.y = h - border - SECTION_MARGIN * 0.5 - footer_height;
    for (text, size) in footer_lines {
        cursor.line(TextRole::Footer, text.to_string(), center, size, Anchor::Middle);
    }

    let logo = logo_size.map(|(lw, lh)| LogoPlacement {
        x: (w - lw as f32) / 2.0,
        y: (h - lh as f32) / 2.0,
        width: lw,
        height: lh,
    });

    CardLayout {
        width,
        height,
        font_size,
        border,
        runs,
        logo,
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// 将版式写成 SVG：边框底色 → 内嵌背景 → Logo → 文本。
fn write_svg(
    layout: &CardLayout,
    palette: &Palette,
    logo_href: Option<&str>,
    options: &RenderOptions,
) -> Result<String, AppError> {
    let fmt_err = |e| AppError::ImageRendererError(format!("SVG formatting error: {e}"));
    let (w, h, b) = (layout.width, layout.height, layout.border);
    let (inner_w, inner_h) = (w as f32 - 2.0 * b, h as f32 - 2.0 * b);
    let mut svg = String::with_capacity(4096 + layout.runs.len() * 160);

    writeln!(
        svg,
        r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#
    )
    .map_err(fmt_err)?;
    writeln!(
        svg,
        r#"<defs><clipPath id="frame"><rect x="{b}" y="{b}" width="{inner_w}" height="{inner_h}"/></clipPath></defs>"#
    )
    .map_err(fmt_err)?;
    writeln!(
        svg,
        r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{}"/>"#,
        palette.border
    )
    .map_err(fmt_err)?;
    writeln!(
        svg,
        r#"<rect x="{b}" y="{b}" width="{inner_w}" height="{inner_h}" fill="{}"/>"#,
        palette.background
    )
    .map_err(fmt_err)?;

    if let (Some(place), Some(href)) = (&layout.logo, logo_href) {
        writeln!(
            svg,
            r#"<image x="{:.1}" y="{:.1}" width="{}" height="{}" opacity="{:.2}" preserveAspectRatio="none" clip-path="url(#frame)" xlink:href="{}"/>"#,
            place.x, place.y, place.width, place.height, options.logo_opacity, href
        )
        .map_err(fmt_err)?;
    }

    writeln!(
        svg,
        r#"<g font-family="{}" clip-path="url(#frame)">"#,
        escape_xml(&options.font_family)
    )
    .map_err(fmt_err)?;
    for run in &layout.runs {
        let (fill, style) = match run.role {
            TextRole::Footer => (palette.footer, ""),
            TextRole::Citation => (palette.text, r#" font-style="italic""#),
            _ => (palette.text, ""),
        };
        // 单词过长时折行也放不下，压缩到可用宽度
        let squeeze = if estimate_text_width(&run.text, run.size) > run.max_width {
            format!(
                r#" textLength="{:.1}" lengthAdjust="spacingAndGlyphs""#,
                run.max_width
            )
        } else {
            String::new()
        };
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="{:.1}" fill="{}" text-anchor="{}"{}{}>{}</text>"#,
            run.x,
            run.y,
            run.size,
            fill,
            run.anchor.as_svg(),
            style,
            squeeze,
            escape_xml(&run.text)
        )
        .map_err(fmt_err)?;
    }
    writeln!(svg, "</g>").map_err(fmt_err)?;
    writeln!(svg, "</svg>").map_err(fmt_err)?;

    Ok(svg)
}

/// 栅格化 SVG 并编码为 PNG（RGBA8）。
pub fn render_svg_to_png(
    svg_data: &str,
    font_db: Arc<fontdb::Database>,
    options: &RenderOptions,
) -> Result<Vec<u8>, AppError> {
    let t0 = Instant::now();
    let speed = options.optimize_speed;
    let opts = UsvgOptions {
        fontdb: font_db,
        font_family: options
            .font_family
            .split(',')
            .next()
            .map(str::trim)
            .unwrap_or("sans-serif")
            .to_string(),
        font_size: 16.0,
        languages: vec!["ar".to_string(), "en".to_string()],
        shape_rendering: if speed {
            usvg::ShapeRendering::OptimizeSpeed
        } else {
            usvg::ShapeRendering::GeometricPrecision
        },
        text_rendering: if speed {
            usvg::TextRendering::OptimizeSpeed
        } else {
            usvg::TextRendering::OptimizeLegibility
        },
        image_rendering: if speed {
            usvg::ImageRendering::OptimizeSpeed
        } else {
            usvg::ImageRendering::OptimizeQuality
        },
        ..Default::default()
    };

    let tree = usvg::Tree::from_data(svg_data.as_bytes(), &opts)
        .map_err(|e| AppError::ImageRendererError(format!("Failed to parse SVG: {e}")))?;
    let t_parse = t0.elapsed();

    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| AppError::ImageRendererError("Failed to create pixmap".to_string()))?;
    render(&tree, Transform::default(), &mut pixmap.as_mut());
    let t_raster = t0.elapsed();

    // 画布被边框矩形完整覆盖（不透明），预乘像素可直接写出
    let mut out = Vec::with_capacity((size.width() * size.height()) as usize);
    {
        let mut encoder = png::Encoder::new(&mut out, size.width(), size.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        if speed {
            encoder.set_compression(png::Compression::Fast);
            encoder.set_filter(png::FilterType::NoFilter);
        } else {
            encoder.set_compression(png::Compression::Default);
            encoder.set_filter(png::FilterType::Paeth);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| AppError::ImageRendererError(format!("PNG write_header error: {e}")))?;
        writer.write_image_data(pixmap.data()).map_err(|e| {
            AppError::ImageRendererError(format!("PNG write_image_data error: {e}"))
        })?;
        writer
            .finish()
            .map_err(|e| AppError::ImageRendererError(format!("PNG finish error: {e}")))?;
    }
    let t_encode = t0.elapsed();

    tracing::debug!(
        "PNG渲染内部分段: 解析={:?}, 栅格化={:?}, 编码={:?}, 总计={:?}",
        t_parse,
        t_raster - t_parse,
        t_encode - t_raster,
        t_encode
    );

    Ok(out)
}

/// 卡片渲染器：持有字体库、可选 Logo 与渲染选项，线程间共享只读。
pub struct CardRenderer {
    fonts: Arc<fontdb::Database>,
    logo: Option<LogoImage>,
    options: RenderOptions,
}

impl CardRenderer {
    pub fn new(
        fonts: Arc<fontdb::Database>,
        logo: Option<LogoImage>,
        options: RenderOptions,
    ) -> Self {
        Self {
            fonts,
            logo,
            options,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// 生成卡片 SVG 文本。
    pub fn compose_svg(&self, record: &VerseRecord, spec: &CardSpec) -> Result<String, AppError> {
        let palette = resolve_palette(&spec.theme);

        // Logo 缩放失败只影响装饰，不影响出图
        let logo = self.logo.as_ref().and_then(|logo| {
            let (lw, lh) = logo.fit_size(spec.width, spec.height);
            logo.scaled_data_uri(lw, lh, self.options.optimize_speed)
                .map(|href| ((lw, lh), href))
                .map_err(|e| tracing::warn!("Logo 缩放失败，跳过绘制: {}", e))
                .ok()
        });
        let (logo_size, logo_href) = logo.unzip();

        let layout = layout_card(record, spec.width, spec.height, &self.options, logo_size);
        write_svg(&layout, palette, logo_href.as_deref(), &self.options)
    }

    /// 生成卡片 PNG（CPU 密集，调用方应放入阻塞线程池）。
    pub fn render_png(&self, record: &VerseRecord, spec: &CardSpec) -> Result<Vec<u8>, AppError> {
        let svg = self.compose_svg(record, spec)?;
        render_svg_to_png(&svg, self.fonts.clone(), &self.options)
    }
}
