pub mod ayat;
pub mod health;
pub mod image;
