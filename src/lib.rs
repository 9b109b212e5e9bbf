pub mod config;
pub mod error;
pub mod logging;
pub mod providers;
pub mod rename_engine;
pub mod tui;
