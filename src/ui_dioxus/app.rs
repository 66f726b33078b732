use dioxus::prelude::*;
use crate::config::ClientConfig;
use crate::domain::task::PageContext;
use crate::page::{self, PageNavigator};
use crate::services::error_handling::Notice;
use crate::services::{Navigator, PortfolioApi, PortfolioClient};
use crate::ui_dioxus::components::Toast;
use crate::ui_dioxus::views::{ContactPage, TaskDetailPage};
use std::rc::Rc;
use tracing::error;

/// Everything components need from the hosting page and the backend.
#[derive(Clone)]
pub struct SiteContext {
    pub config: ClientConfig,
    pub page: PageContext,
    pub api: Rc<dyn PortfolioApi>,
    pub navigator: Rc<dyn Navigator>,
}

fn load_config() -> ClientConfig {
    #[cfg(target_arch = "wasm32")]
    {
        let origin = web_sys::window().and_then(|w| w.location().origin().ok());
        match origin {
            Some(origin) => ClientConfig::default().with_base_url(origin),
            None => ClientConfig::default(),
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    ClientConfig::from_env()
}

fn build_site_context() -> Result<SiteContext, String> {
    let config = load_config();
    let page = page::load_page_context(&config).unwrap_or_else(|e| {
        error!("Could not read page data: {:#}", e);
        PageContext {
            origin: config.base_url.clone(),
            ..PageContext::default()
        }
    });
    let api = PortfolioClient::new(&config).map_err(|e| e.to_string())?;

    Ok(SiteContext {
        config,
        page,
        api: Rc::new(api),
        navigator: Rc::new(PageNavigator::default()),
    })
}

#[component]
pub fn App() -> Element {
    let site = use_hook(build_site_context);
    use_context_provider(|| Signal::new(None::<Notice>));

    match site {
        Ok(site) => {
            use_context_provider(|| site.clone());
            let has_task = site.page.task.is_some();

            rsx! {
                div {
                    class: "app-container",
                    if has_task {
                        TaskDetailPage {}
                    } else {
                        ContactPage {}
                    }
                    Toast {}
                }
            }
        }
        Err(message) => rsx! {
            div {
                style: "padding: 20px; background: #fee; color: #c00;",
                "Failed to start: {message}"
            }
        },
    }
}
