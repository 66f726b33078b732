use dioxus::prelude::*;
use crate::services::error_handling::{Notice, UserErrorFormatter};
use crate::services::step_content::build_process_steps;
use crate::services::task_deletion::{DeletePhase, TaskDeletionFlow};
use crate::ui_dioxus::app::SiteContext;
use crate::ui_dioxus::components::{DeleteTaskModal, ProcessEditModal, ProcessSteps};

#[component]
pub fn TaskDetailPage() -> Element {
    let site = use_context::<SiteContext>();
    let mut notice = use_context::<Signal<Option<Notice>>>();
    let mut editing = use_signal(|| false);
    let mut delete_phase = use_signal(|| DeletePhase::Idle);

    let deletion = use_hook(|| TaskDeletionFlow::new(&site.config, site.api.clone(), site.navigator.clone()));

    let Some(task) = site.page.task.clone() else {
        return rsx! { p { "No task on this page." } };
    };
    let steps = build_process_steps(&task, &site.page.origin);

    let open_delete = {
        let deletion = deletion.clone();
        move |_| {
            deletion.open();
            delete_phase.set(deletion.phase());
        }
    };
    let dismiss_delete = {
        let deletion = deletion.clone();
        move |_| {
            deletion.dismiss();
            delete_phase.set(deletion.phase());
        }
    };
    let confirm_delete = {
        let deletion = deletion.clone();
        let task_id = task.id;
        let csrf_token = site.page.csrf_token.clone();
        move |_| {
            let deletion = deletion.clone();
            let csrf_token = csrf_token.clone();
            delete_phase.set(DeletePhase::Deleting);
            spawn(async move {
                let result = deletion.confirm(task_id, csrf_token.as_deref()).await;
                delete_phase.set(deletion.phase());
                match result {
                    Ok(done) => notice.set(Some(done)),
                    Err(e) => notice.set(Some(UserErrorFormatter::format_for_ui(&e))),
                }
            });
        }
    };

    let title = if task.title.is_empty() { "Task".to_string() } else { task.title.clone() };

    rsx! {
        div {
            class: "task-detail",
            style: "max-width: 960px; margin: 0 auto; padding: 24px;",

            input { r#type: "hidden", id: "task-id", value: task.id.map(|id| id.to_string()).unwrap_or_default() }

            div {
                style: "display: flex; justify-content: space-between; align-items: center; margin-bottom: 20px;",
                h1 { style: "margin: 0; font-size: 28px;", "{title}" }
                div {
                    style: "display: flex; gap: 10px;",
                    button {
                        id: "edit-process-button",
                        style: "padding: 8px 16px; border: none; background: #3b82f6; color: white;
                               border-radius: 4px; cursor: pointer;",
                        onclick: move |_| editing.set(true),
                        "Edit process"
                    }
                    button {
                        id: "delete-task-button",
                        style: "padding: 8px 16px; border: 1px solid #dc2626; background: white; color: #dc2626;
                               border-radius: 4px; cursor: pointer;",
                        onclick: open_delete,
                        "Delete task"
                    }
                }
            }

            h2 { style: "font-size: 20px; margin: 0 0 12px 0;", "Process" }
            ProcessSteps { steps: steps }

            if *editing.read() {
                ProcessEditModal {
                    task: task.clone(),
                    on_close: move |_| editing.set(false),
                }
            }

            if *delete_phase.read() != DeletePhase::Idle {
                DeleteTaskModal {
                    task_title: title.clone(),
                    phase: *delete_phase.read(),
                    on_confirm: confirm_delete,
                    on_cancel: dismiss_delete,
                }
            }
        }
    }
}
