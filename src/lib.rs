pub mod art;
pub mod config;
pub mod http;

pub use art::{ArtResolver, Resolution, get_album_art};
pub use config::Config;
