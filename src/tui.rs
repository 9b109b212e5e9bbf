pub mod app;
pub mod events;
pub mod focus;
pub mod models;
pub mod preview;
pub mod rendering;
pub mod validation;

pub use app::{App, Message};
pub use events::{EffectRunner, run_tui};
