use once_cell::sync::Lazy;
use std::collections::HashMap;

/// 未知主题名回退到的主题
pub const DEFAULT_THEME: &str = "dark";

/// 卡片配色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub border: &'static str,
    pub background: &'static str,
    pub text: &'static str,
    pub footer: &'static str,
}

const fn palette(
    border: &'static str,
    background: &'static str,
    text: &'static str,
    footer: &'static str,
) -> Palette {
    Palette {
        border,
        background,
        text,
        footer,
    }
}

/// 主题名 → 配色（第一项为回退主题）
static THEMES: [(&str, Palette); 7] = [
    ("dark", palette("#444444", "#1a1a1d", "#ffffff", "#aaaaaa")),
    ("desert", palette("#c2a878", "#f4e4c1", "#4a3b2a", "#8b6f47")),
    ("forest", palette("#2e7d32", "#1b3a1f", "#e8f5e9", "#a5d6a7")),
    ("light", palette("#cccccc", "#ffffff", "#000000", "#555555")),
    ("ocean", palette("#0277bd", "#0a2a43", "#e1f5fe", "#81d4fa")),
    ("royal", palette("#d4af37", "#2a1b4a", "#f5e9ff", "#d4af37")),
    ("sunset", palette("#ff7043", "#3e1f2b", "#fff3e0", "#ffab91")),
];

static REGISTRY: Lazy<HashMap<&'static str, Palette>> =
    Lazy::new(|| THEMES.iter().copied().collect());

/// 按名称查找配色（忽略首尾空白与 ASCII 大小写），未命中时返回 dark。
pub fn resolve_palette(name: &str) -> &'static Palette {
    let key = name.trim().to_ascii_lowercase();
    REGISTRY.get(key.as_str()).unwrap_or(&THEMES[0].1)
}

/// 已注册的主题名（字母序）
pub fn theme_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}
