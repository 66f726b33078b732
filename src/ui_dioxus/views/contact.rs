use dioxus::prelude::*;
use crate::ui_dioxus::app::SiteContext;
use crate::ui_dioxus::components::{ContactForm, ProjectFilter};

/// Landing page: project filters and the contact form.
#[component]
pub fn ContactPage() -> Element {
    let site = use_context::<SiteContext>();

    rsx! {
        div {
            style: "max-width: 960px; margin: 0 auto; padding: 24px;",
            section {
                h2 { style: "font-size: 22px;", "Projects" }
                ProjectFilter {
                    categories: site.page.categories.clone(),
                    technologies: site.page.technologies.clone(),
                }
            }
            section {
                id: "contact",
                h2 { style: "font-size: 22px;", "Contact" }
                ContactForm {}
            }
        }
    }
}
