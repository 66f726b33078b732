use crate::domain::step_image::ImageKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the portfolio backend, without a trailing slash
    pub base_url: String,

    /// Prefix for bare relative image paths in the editor gallery
    pub media_prefix: String,

    /// Largest accepted step image, in bytes
    pub max_upload_bytes: u64,

    pub accepted_image_kinds: Vec<ImageKind>,

    /// Pending file names longer than this are cut and suffixed with "..."
    pub file_label_max_chars: usize,

    pub save_redirect_delay_ms: u64,
    pub delete_redirect_delay_ms: u64,
    pub contact_submit_delay_ms: u64,

    /// Where a deleted task sends the user
    pub task_list_path: String,

    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            media_prefix: "/media/".to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            accepted_image_kinds: ImageKind::ALL.to_vec(),
            file_label_max_chars: 15,
            save_redirect_delay_ms: 1000,
            delete_redirect_delay_ms: 1500,
            contact_submit_delay_ms: 1500,
            task_list_path: "/portfolio/tasks/".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `PORTFOLIO_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("PORTFOLIO_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(bytes) = env_number("PORTFOLIO_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = bytes;
        }
        if let Some(secs) = env_number("PORTFOLIO_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = secs;
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn save_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.save_redirect_delay_ms)
    }

    pub fn delete_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.delete_redirect_delay_ms)
    }

    pub fn contact_submit_delay(&self) -> Duration {
        Duration::from_millis(self.contact_submit_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn task_detail_path(project_id: i64, task_id: i64) -> String {
        format!("/projects/{}/tasks/{}/", project_id, task_id)
    }
}

fn env_number(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key = %key, value = %raw, "Ignoring non-numeric configuration override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.accepted_image_kinds.len(), 4);
        assert_eq!(config.save_redirect_delay(), Duration::from_secs(1));
        assert_eq!(config.delete_redirect_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = ClientConfig::default().with_base_url("https://example.org/");
        assert_eq!(config.base_url, "https://example.org");
    }

    #[test]
    fn test_task_detail_path() {
        assert_eq!(ClientConfig::task_detail_path(3, 7), "/projects/3/tasks/7/");
    }
}
