//! UI layer for the desktop app: window shell, image cards, result panel.

pub mod app;

pub use app::ImagiNetApp;
