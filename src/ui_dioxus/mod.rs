// Dioxus UI module - modern reactive UI framework
pub mod app;
pub mod components;
pub mod views;

pub use app::App;
