#![allow(clippy::new_without_default)] // useless, djarch isn't meant to be used as a library

pub mod config;
mod editor;
pub use editor::Editor;
pub mod persistence;
pub mod storage;
pub mod util;
