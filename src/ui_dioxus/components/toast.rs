use dioxus::prelude::*;
use crate::page;
use crate::services::error_handling::Notice;
use std::time::Duration;

const TOAST_LIFETIME: Duration = Duration::from_secs(3);

/// Shows the latest notice in the top-right corner. A newer notice
/// replaces the current one.
#[component]
pub fn Toast() -> Element {
    let mut notice = use_context::<Signal<Option<Notice>>>();

    use_effect(move || {
        let shown = notice.read().clone();
        if shown.is_some() {
            spawn(async move {
                page::sleep(TOAST_LIFETIME).await;
                if *notice.peek() == shown {
                    notice.set(None);
                }
            });
        }
    });

    let current = notice.read().clone();
    match current {
        Some(Notice { level, message }) => rsx! {
            div {
                id: "toast-message",
                style: format!("position: fixed; top: 20px; right: 20px; padding: 12px 24px;
                       border-radius: 8px; color: white; font-size: 14px; font-weight: 500;
                       z-index: 10000; background: {};
                       box-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1);", level.color()),
                onclick: move |_| notice.set(None),
                "{message}"
            }
        },
        None => rsx! {},
    }
}
