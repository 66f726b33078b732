pub mod config;
pub mod domain;
pub mod page;
pub mod services;
pub mod telemetry;
pub mod ui_dioxus;

// Make test_helpers available for integration tests
#[cfg(not(target_arch = "wasm32"))]
pub mod test_helpers;
