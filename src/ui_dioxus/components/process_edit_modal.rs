use dioxus::prelude::*;
use crate::domain::step_image::{SelectedFile, Step};
use crate::domain::task::TaskDescriptor;
use crate::services::error_handling::Notice;
use crate::services::gallery::{DeleteTarget, GalleryView};
use crate::services::staging::CommitOutcome;
use crate::services::{DataUrlReader, EditorEvent, EditorHandle, EditorServices};
use crate::ui_dioxus::app::SiteContext;
use crate::ui_dioxus::components::{StepImageGallery, UploadProgress};
use std::path::Path;
use std::rc::Rc;
use tracing::warn;

const ACCEPTED_TYPES: &str = "image/jpeg,image/png,image/gif,image/webp";

/// Modal for editing a task's process text and its step images. All image
/// changes stay staged until "Save changes".
#[component]
pub fn ProcessEditModal(task: TaskDescriptor, on_close: EventHandler<()>) -> Element {
    let site = use_context::<SiteContext>();
    let notice = use_context::<Signal<Option<Notice>>>();

    let mut process = use_signal(|| task.process.clone());
    let mut step_options = use_signal(Vec::<Step>::new);
    let mut selected_step = use_signal(|| Some(Step::first()));
    let mut selected_files = use_signal(Vec::<SelectedFile>::new);
    let mut description = use_signal(String::new);
    let gallery = use_signal(GalleryView::default);
    let progress = use_signal(|| None::<(usize, usize)>);
    let submit_enabled = use_signal(|| true);

    let handle = use_hook(|| {
        let handle = EditorHandle::new(
            site.config.clone(),
            EditorServices {
                api: site.api.clone(),
                reader: Rc::new(DataUrlReader),
                navigator: site.navigator.clone(),
            },
        );
        handle.set_render_sink(Rc::new(move |view: &GalleryView| {
            let mut gallery = gallery;
            gallery.set(view.clone());
        }));
        handle.set_listener(Rc::new(move |event: EditorEvent| {
            let (mut notice, mut progress, mut submit_enabled) = (notice, progress, submit_enabled);
            match event {
                EditorEvent::Notice(n) => notice.set(Some(n)),
                EditorEvent::UploadProgress { processed, total } => progress.set(Some((processed, total))),
                EditorEvent::UploadFinished { .. } => progress.set(None),
                EditorEvent::SubmitEnabled(enabled) => submit_enabled.set(enabled),
            }
        }));
        handle.open(&task);
        step_options.set(handle.step_options());
        handle
    });

    use_drop({
        let handle = handle.clone();
        move || handle.discard()
    });

    let on_process_input = {
        let handle = handle.clone();
        move |e: FormEvent| {
            let text = e.value();
            let options = handle.set_process_text(&text);
            // Keep the selection on a step the process still has.
            let current = *selected_step.peek();
            if current.is_none_or(|step| !options.contains(&step)) {
                selected_step.set(options.first().copied());
            }
            step_options.set(options);
            process.set(text);
        }
    };

    let on_files = move |e: FormEvent| {
        let Some(engine) = e.files() else {
            return;
        };
        spawn(async move {
            let mut files = Vec::new();
            for path in engine.files() {
                let name = Path::new(&path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone());
                match engine.read_file(&path).await {
                    Some(bytes) => files.push(SelectedFile::from_bytes(name, bytes)),
                    None => warn!(file = %name, "Could not read selected file"),
                }
            }
            selected_files.set(files);
        });
    };

    let on_add = {
        let handle = handle.clone();
        move |_| {
            let handle = handle.clone();
            let files = selected_files.read().clone();
            let text = description.read().clone();
            let step = *selected_step.read();
            spawn(async move {
                if let Ok(staged) = handle.stage_upload(step, files, &text).await {
                    if staged > 0 {
                        selected_files.set(Vec::new());
                        description.set(String::new());
                    }
                }
            });
        }
    };

    let on_delete = {
        let handle = handle.clone();
        move |target: DeleteTarget| {
            handle.click_delete(&target);
        }
    };

    let on_save = {
        let handle = handle.clone();
        let task_id = task.id;
        let project_id = site.page.project.as_ref().and_then(|p| p.id);
        let csrf_token = site.page.csrf_token.clone();
        move |_| {
            let handle = handle.clone();
            let csrf_token = csrf_token.clone();
            let text = process.read().clone();
            spawn(async move {
                let outcome = handle.commit(task_id, project_id, &text, csrf_token.as_deref()).await;
                if let Ok(CommitOutcome::Saved { .. }) = outcome {
                    on_close.call(());
                }
            });
        }
    };

    let file_feedback = match selected_files.read().len() {
        0 => None,
        1 => Some("1 file selected".to_string()),
        n => Some(format!("{} files selected", n)),
    };
    let saving = !*submit_enabled.read();

    rsx! {
        div {
            class: "modal-backdrop",
            style: "position: fixed; top: 0; left: 0; right: 0; bottom: 0;
                   background: rgba(0, 0, 0, 0.5); z-index: 999;
                   display: flex; align-items: center; justify-content: center;",
            onclick: move |_| on_close.call(()),

            div {
                id: "editProcessModal",
                style: "background: white; border-radius: 12px; padding: 24px;
                       width: 90%; max-width: 760px; max-height: 85vh; overflow-y: auto;
                       box-shadow: 0 10px 40px rgba(0, 0, 0, 0.2);",
                onclick: move |e| e.stop_propagation(),

                // Header
                div {
                    style: "display: flex; justify-content: space-between; align-items: center; margin-bottom: 20px;",
                    h2 { style: "margin: 0; font-size: 22px; font-weight: 600;", "Edit Process" }
                    button {
                        style: "background: none; border: none; font-size: 24px; cursor: pointer;",
                        onclick: move |_| on_close.call(()),
                        "×"
                    }
                }

                // Process text, one step per line
                div {
                    style: "margin-bottom: 20px;",
                    label { style: "display: block; margin-bottom: 5px; font-weight: 500;", "Process (one step per line)" }
                    textarea {
                        id: "process-content",
                        style: "width: 100%; min-height: 140px; padding: 8px 12px; border: 1px solid #ddd;
                               border-radius: 4px; font-size: 14px; font-family: inherit; resize: vertical;",
                        value: "{process}",
                        oninput: on_process_input,
                    }
                }

                // Upload form
                div {
                    style: "display: grid; grid-template-columns: 1fr 2fr; gap: 12px; margin-bottom: 12px;",
                    select {
                        id: "step-select",
                        style: "padding: 8px 12px; border: 1px solid #ddd; border-radius: 4px;",
                        onchange: move |e| selected_step.set(Step::parse_lenient(&e.value())),
                        for step in step_options.read().iter().copied() {
                            option {
                                key: "{step}",
                                value: "{step}",
                                selected: *selected_step.read() == Some(step),
                                "Step {step}"
                            }
                        }
                    }
                    input {
                        r#type: "text",
                        style: "padding: 8px 12px; border: 1px solid #ddd; border-radius: 4px;",
                        placeholder: "Image description (optional)",
                        value: "{description}",
                        oninput: move |e| description.set(e.value()),
                    }
                }
                div {
                    style: "display: flex; gap: 12px; align-items: center; margin-bottom: 20px;",
                    input {
                        r#type: "file",
                        accept: ACCEPTED_TYPES,
                        multiple: true,
                        onchange: on_files,
                    }
                    if let Some(feedback) = file_feedback {
                        span { id: "file-feedback", style: "font-size: 13px; color: #6b7280;", "{feedback}" }
                    }
                    button {
                        style: "margin-left: auto; padding: 8px 16px; border: none; background: #10b981;
                               color: white; border-radius: 4px; cursor: pointer;",
                        onclick: on_add,
                        "Add to queue"
                    }
                }

                StepImageGallery { view: gallery.read().clone(), on_delete: on_delete }

                // Footer
                div {
                    style: "display: flex; justify-content: flex-end; gap: 10px; margin-top: 24px;",
                    button {
                        style: "padding: 8px 20px; border: 1px solid #ddd; background: white;
                               color: #333; border-radius: 4px; cursor: pointer;",
                        onclick: move |_| on_close.call(()),
                        "Cancel"
                    }
                    button {
                        style: "padding: 8px 20px; border: none; background: #3b82f6;
                               color: white; border-radius: 4px; cursor: pointer;",
                        disabled: saving,
                        onclick: on_save,
                        if saving { "Saving..." } else { "Save changes" }
                    }
                }
            }

            if let Some((processed, total)) = *progress.read() {
                UploadProgress { processed: processed, total: total }
            }
        }
    }
}
