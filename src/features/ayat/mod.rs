pub mod handler;
pub mod models;
pub mod selector;
pub mod source;

pub use handler::create_ayat_router;
pub use models::{BilingualText, VerseRecord};
pub use source::{AyatSource, HttpAyatSource, StaticAyatSource};
