use dioxus::prelude::*;
use crate::services::task_deletion::DeletePhase;

#[component]
pub fn DeleteTaskModal(
    task_title: String,
    phase: DeletePhase,
    on_confirm: EventHandler<()>,
    on_cancel: EventHandler<()>,
) -> Element {
    let deleting = phase == DeletePhase::Deleting;

    rsx! {
        // Modal backdrop
        div {
            id: "deleteConfirmModal",
            tabindex: 0,
            style: "position: fixed; top: 0; left: 0; right: 0; bottom: 0;
                   background: rgba(0, 0, 0, 0.5); z-index: 1000;
                   display: flex; align-items: center; justify-content: center;",
            onclick: move |_| on_cancel.call(()),
            onkeydown: move |e: KeyboardEvent| {
                if e.key() == Key::Escape {
                    on_cancel.call(());
                }
            },
            onmounted: move |e| async move {
                let _ = e.set_focus(true).await;
            },

            // Modal content
            div {
                style: "background: white; border-radius: 12px; padding: 24px;
                       width: 90%; max-width: 400px;
                       box-shadow: 0 10px 40px rgba(0, 0, 0, 0.2);",
                onclick: move |e| e.stop_propagation(),

                h3 {
                    style: "margin: 0 0 12px 0; font-size: 20px; font-weight: 600;",
                    "Delete task"
                }

                p {
                    style: "margin: 0 0 24px 0; color: #666; line-height: 1.5;",
                    "Delete \"{task_title}\"? This cannot be undone."
                }

                div {
                    style: "display: flex; justify-content: flex-end; gap: 10px;",

                    button {
                        id: "cancel-delete",
                        style: "padding: 8px 20px; border: 1px solid #ddd;
                               background: white; color: #333; border-radius: 4px;
                               cursor: pointer; font-size: 14px;",
                        onclick: move |_| on_cancel.call(()),
                        "Cancel"
                    }

                    button {
                        id: "confirm-delete",
                        style: "padding: 8px 20px; border: none;
                               background: #dc2626; color: white; border-radius: 4px;
                               cursor: pointer; font-size: 14px;",
                        disabled: deleting,
                        onclick: move |_| on_confirm.call(()),
                        if deleting { "Deleting..." } else { "Confirm delete" }
                    }
                }
            }
        }
    }
}
