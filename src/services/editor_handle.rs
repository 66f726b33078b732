use crate::config::ClientConfig;
use crate::domain::step_image::{DeletionKey, ImageRef, SelectedFile, Step};
use crate::domain::task::TaskDescriptor;
use crate::services::error_handling::{Notice, PortfolioError, UserErrorFormatter};
use crate::services::gallery::{DeleteHandler, DeleteTarget, GalleryContainer, GalleryView, RenderSink};
use crate::services::portfolio_api::PortfolioApi;
use crate::services::preview::PreviewReader;
use crate::services::staging::{CommitOutcome, DeletionEffect, EditorPhase, StagingEditor, UploadBatch};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, warn};

/// Side effects the editor asks its host to show.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Notice(Notice),
    UploadProgress { processed: usize, total: usize },
    UploadFinished { accepted: usize, total: usize },
    SubmitEnabled(bool),
}

pub type EventListener = Rc<dyn Fn(EditorEvent)>;

/// Schedules a page navigation.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator {
    fn navigate_after(&self, url: String, delay: Duration);
}

/// Collaborators the editor talks to.
#[derive(Clone)]
pub struct EditorServices {
    pub api: Rc<dyn PortfolioApi>,
    pub reader: Rc<dyn PreviewReader>,
    pub navigator: Rc<dyn Navigator>,
}

struct Shared {
    editor: RefCell<StagingEditor>,
    container: RefCell<GalleryContainer>,
    listener: RefCell<Option<EventListener>>,
    services: EditorServices,
    config: ClientConfig,
    delete_handler: DeleteHandler,
}

/// Async driver around `StagingEditor` for a single-threaded UI.
///
/// Borrows of the editor and the container are short and never span an
/// `.await`, so completions from reads and requests can interleave with
/// user commands in any order.
#[derive(Clone)]
pub struct EditorHandle {
    shared: Rc<Shared>,
}

impl EditorHandle {
    pub fn new(config: ClientConfig, services: EditorServices) -> Self {
        let shared = Rc::new_cyclic(|weak: &Weak<Shared>| {
            let weak = weak.clone();
            let delete_handler: DeleteHandler = Rc::new(move |target: &DeleteTarget| {
                if let Some(shared) = weak.upgrade() {
                    let handle = EditorHandle { shared };
                    let _ = handle.stage_deletion(target.step, &target.image);
                }
            });
            Shared {
                editor: RefCell::new(StagingEditor::new(&config)),
                container: RefCell::new(GalleryContainer::new()),
                listener: RefCell::new(None),
                services,
                config,
                delete_handler,
            }
        });
        Self { shared }
    }

    pub fn set_listener(&self, listener: EventListener) {
        *self.shared.listener.borrow_mut() = Some(listener);
    }

    /// Replaces the container with one that forwards every paint to `sink`.
    pub fn set_render_sink(&self, sink: RenderSink) {
        *self.shared.container.borrow_mut() = GalleryContainer::with_sink(sink);
    }

    fn emit(&self, event: EditorEvent) {
        let listener = self.shared.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(event);
        }
    }

    fn notify(&self, notice: Notice) {
        self.emit(EditorEvent::Notice(notice));
    }

    pub fn phase(&self) -> EditorPhase {
        self.shared.editor.borrow().phase()
    }

    pub fn step_options(&self) -> Vec<Step> {
        self.shared.editor.borrow().step_options().to_vec()
    }

    pub fn pending_count(&self) -> usize {
        self.shared.editor.borrow().pending_uploads().len()
    }

    pub fn deletion_marks(&self) -> Vec<DeletionKey> {
        self.shared.editor.borrow().deletion_marks()
    }

    pub fn view(&self) -> GalleryView {
        self.shared.container.borrow().view().clone()
    }

    pub fn paint_count(&self) -> usize {
        self.shared.container.borrow().paint_count()
    }

    pub fn has_delete_handler(&self) -> bool {
        self.shared.container.borrow().has_delete_handler()
    }

    pub fn open(&self, task: &TaskDescriptor) {
        self.shared.editor.borrow_mut().open_session(task);
        self.render();
        self.emit(EditorEvent::SubmitEnabled(true));
    }

    pub fn close(&self) {
        self.shared.editor.borrow_mut().close_session();
        self.render();
    }

    /// Closes without painting, for when the gallery itself is going away.
    pub fn discard(&self) {
        self.shared.editor.borrow_mut().close_session();
    }

    pub fn set_process_text(&self, process: &str) -> Vec<Step> {
        let mut editor = self.shared.editor.borrow_mut();
        editor.set_process_text(process);
        editor.step_options().to_vec()
    }

    /// Paints the current working set and rebinds the delete handler.
    pub fn render(&self) {
        let view = self.shared.editor.borrow().render();
        let mut container = self.shared.container.borrow_mut();
        container.bind_delete(self.shared.delete_handler.clone());
        container.paint(view);
    }

    /// Routes a delete click through the container's delegated handler.
    /// Returns false when the clicked card is no longer shown.
    pub fn click_delete(&self, target: &DeleteTarget) -> bool {
        let handler = self.shared.container.borrow().resolve_delete(target);
        match handler {
            Some(handler) => {
                handler(target);
                true
            }
            None => false,
        }
    }

    pub fn stage_deletion(&self, step: Step, image: &ImageRef) -> Result<DeletionEffect, PortfolioError> {
        let effect = self.shared.editor.borrow_mut().stage_deletion(step, image);
        match effect {
            Ok(effect) => {
                self.render();
                if effect == DeletionEffect::Marked {
                    self.notify(Notice::info("Image marked for deletion; it will be removed when you save"));
                }
                Ok(effect)
            }
            Err(e) => {
                self.notify(UserErrorFormatter::format_for_ui(&e));
                Err(e)
            }
        }
    }

    /// Validates the files, reads accepted ones into previews concurrently,
    /// and stages each one as soon as its read completes. Returns how many
    /// files were staged.
    pub async fn stage_upload(
        &self,
        step: Option<Step>,
        files: Vec<SelectedFile>,
        description: &str,
    ) -> Result<usize, PortfolioError> {
        let prepared = self.shared.editor.borrow().prepare_upload(step, files, description);
        let UploadBatch {
            token,
            step,
            description,
            total,
            accepted,
            rejected,
        } = match prepared {
            Ok(batch) => batch,
            Err(e) => {
                self.notify(UserErrorFormatter::format_for_ui(&e));
                return Err(e);
            }
        };

        let mut processed = rejected.len();
        for error in &rejected {
            self.notify(UserErrorFormatter::format_for_ui(error));
        }
        self.emit(EditorEvent::UploadProgress { processed, total });

        let mut reads: FuturesUnordered<_> = accepted
            .into_iter()
            .map(|file| {
                let reader = self.shared.services.reader.clone();
                async move {
                    let result = reader.read_data_url(&file).await;
                    (file, result)
                }
            })
            .collect();

        let mut staged = 0;
        while let Some((file, result)) = reads.next().await {
            processed += 1;
            match result {
                Ok(preview) => {
                    let id = self
                        .shared
                        .editor
                        .borrow_mut()
                        .accept_preview(token, step, file, preview, &description);
                    if id.is_none() {
                        debug!(staged, "Editor closed during upload; dropping remaining previews");
                        return Ok(staged);
                    }
                    staged += 1;
                    self.render();
                }
                Err(e) => {
                    warn!(file = %e.file_name, error = %e.message, "Preview read failed");
                    self.notify(Notice::error(format!("Failed to read image {}, please try again", e.file_name)));
                }
            }
            self.emit(EditorEvent::UploadProgress { processed, total });
        }

        self.emit(EditorEvent::UploadFinished { accepted: staged, total });
        if staged > 0 {
            self.notify(Notice::success(format!("Added {} image(s) to the upload queue", staged)));
        }
        Ok(staged)
    }

    /// Sends the staged changes in one request. Local failures never reach
    /// the network; the returned outcome says how the save ended.
    pub async fn commit(
        &self,
        task_id: Option<i64>,
        project_id: Option<i64>,
        process_text: &str,
        csrf_token: Option<&str>,
    ) -> Result<CommitOutcome, PortfolioError> {
        let begun = self
            .shared
            .editor
            .borrow_mut()
            .begin_commit(task_id, project_id, process_text, csrf_token);
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(e) => {
                self.notify(UserErrorFormatter::format_for_ui(&e));
                return Err(e);
            }
        };
        self.emit(EditorEvent::SubmitEnabled(false));

        let api = self.shared.services.api.clone();
        let result = api
            .update_process(ticket.project_id, ticket.task_id, ticket.form.clone())
            .await;

        let outcome = self.shared.editor.borrow_mut().finish_commit(&ticket, result);
        match &outcome {
            CommitOutcome::Saved { redirect_url } => {
                self.render();
                self.notify(Notice::success("Saved, reloading the page..."));
                self.shared
                    .services
                    .navigator
                    .navigate_after(redirect_url.clone(), self.shared.config.save_redirect_delay());
            }
            CommitOutcome::Failed(e) => {
                self.notify(UserErrorFormatter::format_for_ui(e));
                self.emit(EditorEvent::SubmitEnabled(true));
            }
            CommitOutcome::Stale => {}
        }
        Ok(outcome)
    }
}
