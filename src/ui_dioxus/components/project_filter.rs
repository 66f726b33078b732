use dioxus::prelude::*;
use crate::services::validation::project_filter_url;
use crate::ui_dioxus::app::SiteContext;
use std::time::Duration;
use tracing::warn;

/// Category and technology selects for the project list. Changing either
/// one goes straight to the filtered list.
#[component]
pub fn ProjectFilter(categories: Vec<String>, technologies: Vec<String>) -> Element {
    let site = use_context::<SiteContext>();
    let mut category = use_signal(String::new);
    let mut technology = use_signal(String::new);

    let go = move |category: String, technology: String| {
        match project_filter_url(&site.config.base_url, &category, &technology) {
            Ok(url) => site.navigator.navigate_after(url.to_string(), Duration::ZERO),
            Err(e) => warn!(error = %e, "Could not build project filter URL"),
        }
    };
    let go_category = go.clone();
    let go_technology = go;

    rsx! {
        div {
            class: "project-filter",
            style: "display: flex; gap: 12px; align-items: center; margin-bottom: 24px;",
            select {
                id: "category-filter",
                class: "filter-select",
                style: "padding: 8px 12px; border: 1px solid #ddd; border-radius: 4px;",
                onchange: move |e| {
                    category.set(e.value());
                    go_category(e.value(), technology.read().clone());
                },
                option { value: "", "All categories" }
                for name in categories {
                    option { key: "{name}", value: "{name}", "{name}" }
                }
            }
            select {
                id: "technology-filter",
                class: "filter-select",
                style: "padding: 8px 12px; border: 1px solid #ddd; border-radius: 4px;",
                onchange: move |e| {
                    technology.set(e.value());
                    go_technology(category.read().clone(), e.value());
                },
                option { value: "", "All technologies" }
                for name in technologies {
                    option { key: "{name}", value: "{name}", "{name}" }
                }
            }
        }
    }
}
