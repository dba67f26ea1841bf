mod assets;
pub mod renderer;
mod theme;
mod types;
mod wrap;

pub use assets::{LogoImage, load_font_db};
pub use renderer::{CardRenderer, RenderOptions, render_svg_to_png};
pub use theme::{DEFAULT_THEME, Palette, resolve_palette, theme_names};
pub use types::{CardOrientation, CardQuery, CardSpec};
pub use wrap::{auto_words_per_line, estimate_text_width, wrap_words, wrap_words_within};
