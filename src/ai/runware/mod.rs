pub mod client;
pub mod image;
pub mod types;

pub use client::RunwareHttpClient;
pub use image::RunwareImageClient;
