//! Bridge to the hosting page: reads the server-injected task/project data
//! and CSRF token once, and performs navigation and timers.

use crate::config::ClientConfig;
use crate::domain::task::{PageContext, ProjectDescriptor, TaskDescriptor};
use crate::services::editor_handle::Navigator;
use crate::services::error_handling::LogHelper;
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

/// Builds the page context from raw injected values. Malformed parts are
/// logged and degrade to absent or empty values.
pub fn context_from_values(
    task: Option<&Value>,
    project: Option<&Value>,
    csrf_token: Option<String>,
    origin: impl Into<String>,
) -> PageContext {
    let task = task.filter(|v| !v.is_null()).map(|value| {
        let (task, warnings) = TaskDescriptor::from_value(value);
        LogHelper::log_data_shape_warnings("window.task", &warnings);
        task
    });
    let project = project.filter(|v| !v.is_null()).map(|value| {
        let (project, warnings) = ProjectDescriptor::from_value(value);
        LogHelper::log_data_shape_warnings("window.project", &warnings);
        project
    });

    PageContext {
        task,
        project,
        csrf_token: csrf_token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        origin: origin.into(),
        ..PageContext::default()
    }
}

/// Reads an injected list of filter options. Non-string entries are skipped.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Native builds read the page data from `PORTFOLIO_PAGE_CONTEXT`, a JSON
/// object with optional `task`, `project`, `csrf_token`, `origin`,
/// `categories` and `technologies` keys.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_page_context(config: &ClientConfig) -> Result<PageContext> {
    let Ok(raw) = std::env::var("PORTFOLIO_PAGE_CONTEXT") else {
        info!("PORTFOLIO_PAGE_CONTEXT not set; starting without a task");
        return Ok(PageContext {
            origin: config.base_url.clone(),
            ..PageContext::default()
        });
    };
    parse_page_context(&raw, config)
}

/// Parses the JSON form of the page data. Only invalid JSON is an error;
/// malformed parts inside it degrade like the browser globals do.
pub fn parse_page_context(raw: &str, config: &ClientConfig) -> Result<PageContext> {
    use anyhow::Context;

    let value: Value = serde_json::from_str(raw)
        .with_context(|| format!("PORTFOLIO_PAGE_CONTEXT is not valid JSON ({} bytes)", raw.len()))?;

    let csrf_token = value.get("csrf_token").and_then(Value::as_str).map(str::to_string);
    let origin = value
        .get("origin")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| config.base_url.clone());
    let mut context = context_from_values(value.get("task"), value.get("project"), csrf_token, origin);
    context.categories = string_list(value.get("categories"));
    context.technologies = string_list(value.get("technologies"));
    Ok(context)
}

#[cfg(target_arch = "wasm32")]
pub fn load_page_context(_config: &ClientConfig) -> Result<PageContext> {
    use wasm_bindgen::JsCast;

    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("No window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("Could not read page origin: {:?}", e))?;

    let global = |name: &str| -> Option<Value> {
        let value = js_sys::Reflect::get(&window, &name.into()).ok()?;
        if value.is_undefined() || value.is_null() {
            return None;
        }
        let json = js_sys::JSON::stringify(&value).ok()?.as_string()?;
        serde_json::from_str(&json).ok()
    };
    let task = global("task");
    let project = global("project");
    let categories = string_list(global("categories").as_ref());
    let technologies = string_list(global("technologies").as_ref());

    let csrf_token = window
        .document()
        .and_then(|doc| doc.query_selector("[name=csrfmiddlewaretoken]").ok().flatten())
        .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
        .map(|input| input.value());

    let mut context = context_from_values(task.as_ref(), project.as_ref(), csrf_token, origin);
    context.categories = categories;
    context.technologies = technologies;
    Ok(context)
}

/// Waits without blocking the UI thread.
pub async fn sleep(delay: Duration) {
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(delay).await;

    #[cfg(target_arch = "wasm32")]
    {
        let (done, wait) = futures::channel::oneshot::channel::<()>();
        set_timeout(delay, move || {
            let _ = done.send(());
        });
        let _ = wait.await;
    }
}

#[cfg(target_arch = "wasm32")]
fn set_timeout(delay: Duration, callback: impl FnOnce() + 'static) {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    let callback = Closure::once_into_js(callback);
    if let Some(window) = web_sys::window() {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay.as_millis() as i32,
        );
    }
}

/// Sets `window.location` after the delay.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct BrowserNavigator;

#[cfg(target_arch = "wasm32")]
impl Navigator for BrowserNavigator {
    fn navigate_after(&self, url: String, delay: Duration) {
        info!(url = %url, delay_ms = delay.as_millis() as u64, "Scheduling navigation");
        set_timeout(delay, move || {
            if let Some(window) = web_sys::window() {
                let _ = window.location().set_href(&url);
            }
        });
    }
}

/// The desktop shell has no page to leave; it only logs where the site
/// would go.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct LoggingNavigator;

#[cfg(not(target_arch = "wasm32"))]
impl Navigator for LoggingNavigator {
    fn navigate_after(&self, url: String, delay: Duration) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!(url = %url, "Navigation requested");
        });
    }
}

#[cfg(target_arch = "wasm32")]
pub type PageNavigator = BrowserNavigator;
#[cfg(not(target_arch = "wasm32"))]
pub type PageNavigator = LoggingNavigator;
