//! Telegram front end for Runware image generation
//!
//! Receives `/img <prompt>` commands, runs one image-inference task per
//! command and replies with the generated image or an error notice.

pub mod ai;
pub mod app;
pub mod commands;
pub mod error;
pub mod generation;
pub mod messages;
pub mod models;
pub mod telegram;

pub use error::{Error, Result};
