use dioxus::prelude::*;
use crate::services::step_content::{ContentSegment, ProcessStepView};

#[component]
fn StepList(steps: Vec<ProcessStepView>) -> Element {
    rsx! {
        for view in steps {
            div {
                key: "{view.step}",
                class: "process-step",
                "data-step": "{view.step}",
                style: "padding: 12px 0; border-bottom: 1px solid #f3f4f6;",
                div {
                    class: "step-content",
                    span { style: "font-weight: 600; margin-right: 8px;", "{view.step}." }
                    for (index, segment) in view.content.iter().cloned().enumerate() {
                        {match segment {
                            ContentSegment::Text(text) => rsx! { span { key: "{index}", "{text}" } },
                            ContentSegment::Image { src } => rsx! {
                                div {
                                    key: "{index}",
                                    class: "task-image-container",
                                    img { class: "task-image", src: "{src}", alt: "Process image", style: "max-width: 100%;" }
                                }
                            },
                        }}
                    }
                }
                if let Some(hint) = view.image_hint() {
                    div {
                        class: "step-image",
                        "data-step": "{view.step}",
                        div {
                            style: "margin-top: 8px; padding: 5px; text-align: center; font-size: 12px;
                                   color: #6b7280; background: #f9fafb; border-radius: 4px;",
                            "{hint}"
                        }
                        div {
                            style: "display: flex; gap: 8px; flex-wrap: nowrap; overflow-x: auto;
                                   margin-top: 10px; padding-bottom: 8px;",
                            for thumb in view.thumbnails.iter().cloned() {
                                div {
                                    key: "{thumb.url}",
                                    title: thumb.description.clone().unwrap_or_default(),
                                    style: "width: 120px; min-width: 120px; height: 120px; border: 1px solid #e5e7eb;
                                           border-radius: 4px; overflow: hidden; display: flex; flex-direction: column;",
                                    div {
                                        style: "height: 85px; display: flex; align-items: center; justify-content: center;
                                               background: #f9f9f9; overflow: hidden;",
                                        img {
                                            src: "{thumb.url}",
                                            alt: "{thumb.alt}",
                                            style: "max-width: 100%; max-height: 100%; object-fit: cover;",
                                        }
                                    }
                                    div {
                                        style: "padding: 4px 6px; font-size: 11px; color: #6b7280; text-align: center;
                                               border-top: 1px solid #e5e7eb;",
                                        "{thumb.label}"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Read-only process steps with a fullscreen view. Escape leaves
/// fullscreen.
#[component]
pub fn ProcessSteps(steps: Vec<ProcessStepView>) -> Element {
    let mut fullscreen = use_signal(|| false);

    if steps.is_empty() {
        return rsx! {
            p { style: "color: #9ca3af;", "No process steps recorded yet." }
        };
    }

    rsx! {
        div {
            class: "process-steps",
            div {
                style: "display: flex; justify-content: flex-end;",
                button {
                    id: "fullscreen-toggle",
                    style: "padding: 4px 12px; border: 1px solid #ddd; background: white; border-radius: 4px; cursor: pointer;",
                    onclick: move |_| fullscreen.set(true),
                    "Fullscreen"
                }
            }
            StepList { steps: steps.clone() }
        }

        if *fullscreen.read() {
            div {
                id: "fullscreen-process-container",
                tabindex: 0,
                style: "position: fixed; top: 0; left: 0; right: 0; bottom: 0; background: white;
                       z-index: 2000; display: flex; flex-direction: column; overflow-y: auto; padding: 32px;",
                onkeydown: move |e: KeyboardEvent| {
                    if e.key() == Key::Escape {
                        fullscreen.set(false);
                    }
                },
                onmounted: move |e| async move {
                    let _ = e.set_focus(true).await;
                },
                div {
                    style: "display: flex; justify-content: space-between; align-items: center; margin-bottom: 1.5rem;",
                    h3 { style: "margin: 0;", "Process - fullscreen" }
                    button {
                        id: "exit-fullscreen",
                        style: "padding: 4px 12px; border: 1px solid #ddd; background: white; border-radius: 4px; cursor: pointer;",
                        onclick: move |_| fullscreen.set(false),
                        "Exit"
                    }
                }
                StepList { steps: steps }
            }
        }
    }
}
