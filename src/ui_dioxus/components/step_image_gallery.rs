use dioxus::prelude::*;
use crate::services::gallery::{DeleteTarget, GalleryView, ThumbnailCard};

/// The editor's image container. It draws whatever `GalleryView` it is
/// given; every delete button reports its card through `on_delete`.
#[component]
pub fn StepImageGallery(view: GalleryView, on_delete: EventHandler<DeleteTarget>) -> Element {
    if view.is_empty() {
        return rsx! {
            div {
                id: "uploaded-images-container",
                div {
                    class: "empty-state",
                    style: "padding: 32px; text-align: center; color: #9ca3af;
                           border: 2px dashed #e5e7eb; border-radius: 8px;",
                    p { style: "margin: 0 0 4px 0; font-weight: 500;", "No step images yet" }
                    p { style: "margin: 0; font-size: 13px;", "Choose a step and add images above" }
                }
            }
        };
    }

    let count_label = view.count_label();

    rsx! {
        div {
            id: "uploaded-images-container",
            for group in view.groups {
                div {
                    key: "{group.step}",
                    class: "step-image-group",
                    style: "margin-bottom: 16px;",
                    h4 {
                        style: "margin: 0 0 8px 0; font-size: 14px; font-weight: 600; color: #374151;",
                        "{group.header}"
                    }
                    div {
                        style: "display: flex; gap: 8px; flex-wrap: nowrap; overflow-x: auto; padding-bottom: 8px;",
                        for card in group.cards {
                            GalleryCard {
                                key: "{card.target.image}",
                                card: card,
                                on_delete: on_delete,
                            }
                        }
                    }
                }
            }
            div {
                style: "font-size: 12px; color: #6b7280; text-align: right;",
                "{count_label}"
            }
        }
    }
}

#[component]
fn GalleryCard(card: ThumbnailCard, on_delete: EventHandler<DeleteTarget>) -> Element {
    // Switches from cover to contain when the image fails to load.
    let mut load_failed = use_signal(|| false);
    let fit = if *load_failed.read() { "contain" } else { "cover" };
    let border = if card.pending { "#f59e0b" } else { "#e5e7eb" };
    let target = card.target.clone();

    rsx! {
        div {
            class: "step-image-card",
            style: "position: relative; width: 120px; min-width: 120px; height: 120px;
                   border: 1px solid {border}; border-radius: 4px; overflow: hidden; background: white;",
            img {
                src: "{card.image_url}",
                alt: "{card.alt}",
                style: "width: 100%; height: 100%; object-fit: {fit};",
                onerror: move |_| load_failed.set(true),
            }
            span {
                style: "position: absolute; top: 4px; left: 4px; background: rgba(0, 0, 0, 0.6);
                       color: white; font-size: 11px; padding: 1px 6px; border-radius: 10px;",
                "{card.step_badge}"
            }
            if card.pending {
                span {
                    style: "position: absolute; top: 4px; right: 28px; background: #f59e0b;
                           color: white; font-size: 11px; padding: 1px 6px; border-radius: 10px;",
                    "Pending"
                }
            }
            if let Some(label) = card.file_label.clone() {
                div {
                    style: "position: absolute; bottom: 0; left: 0; right: 0; background: rgba(0, 0, 0, 0.6);
                           color: white; font-size: 11px; padding: 2px 4px; white-space: nowrap;",
                    "{label}"
                }
            }
            button {
                class: "delete-image-btn",
                style: "position: absolute; top: 4px; right: 4px; width: 20px; height: 20px;
                       border: none; border-radius: 50%; background: #ef4444; color: white;
                       cursor: pointer; font-size: 12px; line-height: 20px; padding: 0;",
                title: "Remove image",
                onclick: move |e| {
                    e.stop_propagation();
                    on_delete.call(target.clone());
                },
                "×"
            }
        }
    }
}
