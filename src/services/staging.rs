use crate::config::ClientConfig;
use crate::domain::step_image::{
    DeletionKey, ImageRef, PendingId, PendingUpload, SelectedFile, Step, StepImage,
};
use crate::domain::task::{TaskDescriptor, step_options};
use crate::services::error_handling::{LogHelper, PortfolioError};
use crate::services::gallery::{GalleryView, RenderOptions, render_gallery};
use crate::services::portfolio_api::{ProcessUpdateForm, UpdateProcessResponse, UploadField};
use crate::services::validation::ImageValidator;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Identifies one open session. A token from a closed or replaced session is
/// stale and everything carrying it is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Closed,
    Open,
    Committing,
}

impl EditorPhase {
    fn describe(self) -> &'static str {
        match self {
            EditorPhase::Closed => "closed",
            EditorPhase::Open => "open",
            EditorPhase::Committing => "saving",
        }
    }
}

#[derive(Debug)]
struct EditorSession {
    token: SessionToken,
    existing_images: Vec<StepImage>,
    pending_uploads: Vec<PendingUpload>,
    deletion_marks: BTreeSet<DeletionKey>,
    step_options: Vec<Step>,
    committing: bool,
}

/// Files of one upload request that passed validation, waiting to be read.
#[derive(Debug)]
pub struct UploadBatch {
    pub token: SessionToken,
    pub step: Step,
    pub description: String,
    pub total: usize,
    pub accepted: Vec<SelectedFile>,
    pub rejected: Vec<PortfolioError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionEffect {
    /// A pending upload was dropped from the queue.
    RemovedPending,
    /// An existing image was marked for removal on save.
    Marked,
    /// Already removed or already marked.
    Unchanged,
}

/// Snapshot handed to the network layer for one save.
#[derive(Debug, Clone)]
pub struct CommitTicket {
    pub token: SessionToken,
    pub project_id: i64,
    pub task_id: i64,
    pub form: ProcessUpdateForm,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Saved { redirect_url: String },
    Failed(PortfolioError),
    /// The response belongs to a session that is no longer open.
    Stale,
}

/// The step-image staging editor: existing images, pending uploads and
/// deletion marks for one open process-edit modal.
///
/// State machine: `Closed -> Open -> (Committing -> Open | Closed)`, with
/// `close_session` allowed from any phase. Staging stays allowed while a
/// save is in flight; a second save is not.
#[derive(Debug)]
pub struct StagingEditor {
    session: Option<EditorSession>,
    generation: u64,
    validator: ImageValidator,
    render_options: RenderOptions,
}

impl StagingEditor {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            session: None,
            generation: 0,
            validator: ImageValidator::from_config(config),
            render_options: RenderOptions {
                media_prefix: config.media_prefix.clone(),
                file_label_max_chars: config.file_label_max_chars,
            },
        }
    }

    pub fn phase(&self) -> EditorPhase {
        match &self.session {
            None => EditorPhase::Closed,
            Some(session) if session.committing => EditorPhase::Committing,
            Some(_) => EditorPhase::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|s| s.token)
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.token() == Some(token)
    }

    /// Starts a fresh session from the task, discarding anything staged
    /// before. Duplicate `(step, id)` images keep their first occurrence.
    pub fn open_session(&mut self, task: &TaskDescriptor) -> SessionToken {
        self.generation += 1;
        let token = SessionToken(self.generation);

        let mut seen = HashSet::new();
        let existing_images: Vec<StepImage> = task
            .step_images
            .iter()
            .filter(|image| {
                let fresh = seen.insert(image.deletion_key());
                if !fresh {
                    warn!(step = %image.step, id = %image.id, "Duplicate step image ignored");
                }
                fresh
            })
            .cloned()
            .collect();

        info!(
            task_id = ?task.id,
            existing = existing_images.len(),
            "Opened process editor session"
        );

        self.session = Some(EditorSession {
            token,
            existing_images,
            pending_uploads: Vec::new(),
            deletion_marks: BTreeSet::new(),
            step_options: step_options(&task.process),
            committing: false,
        });
        token
    }

    /// Discards the session and everything staged in it. No endpoint is
    /// called; in-flight work for this session becomes stale.
    pub fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            info!(
                pending = session.pending_uploads.len(),
                marked = session.deletion_marks.len(),
                "Closed process editor session"
            );
        }
    }

    /// Regenerates the step options after the process text changed.
    pub fn set_process_text(&mut self, process: &str) {
        if let Some(session) = self.session.as_mut() {
            session.step_options = step_options(process);
        }
    }

    pub fn step_options(&self) -> &[Step] {
        self.session.as_ref().map(|s| s.step_options.as_slice()).unwrap_or(&[])
    }

    pub fn existing_images(&self) -> &[StepImage] {
        self.session.as_ref().map(|s| s.existing_images.as_slice()).unwrap_or(&[])
    }

    pub fn pending_uploads(&self) -> &[PendingUpload] {
        self.session.as_ref().map(|s| s.pending_uploads.as_slice()).unwrap_or(&[])
    }

    pub fn deletion_marks(&self) -> Vec<DeletionKey> {
        self.session
            .as_ref()
            .map(|s| s.deletion_marks.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Validates an upload request. Individual bad files land in
    /// `rejected`; only a missing step, an empty selection or a closed
    /// editor fail the whole request, as does a step the current process
    /// text no longer has.
    pub fn prepare_upload(
        &self,
        step: Option<Step>,
        files: Vec<SelectedFile>,
        description: &str,
    ) -> Result<UploadBatch, PortfolioError> {
        let session = self.session.as_ref().ok_or(PortfolioError::InvalidState {
            operation: "stage images",
            state: EditorPhase::Closed.describe(),
        })?;
        let step = step.ok_or_else(|| PortfolioError::validation("step", "Please choose a step"))?;
        if !session.step_options.contains(&step) {
            warn!(step = %step, options = session.step_options.len(), "Upload step is not in the process");
            return Err(PortfolioError::validation(
                "step",
                format!("Step {} is not part of the process; please choose a step", step),
            ));
        }
        if files.is_empty() {
            return Err(PortfolioError::validation("files", "Please choose images to upload"));
        }

        let total = files.len();
        let mut accepted = Vec::with_capacity(total);
        let mut rejected = Vec::new();
        for file in files {
            match self.validator.check(&file) {
                Ok(_) => accepted.push(file),
                Err(e) => {
                    LogHelper::log_rejected_file(&e);
                    rejected.push(e);
                }
            }
        }

        debug!(step = %step, total, accepted = accepted.len(), "Prepared upload batch");
        Ok(UploadBatch {
            token: session.token,
            step,
            description: description.trim().to_string(),
            total,
            accepted,
            rejected,
        })
    }

    /// Appends a file whose preview finished reading. Returns `None` when
    /// the batch belongs to a session that is no longer open.
    pub fn accept_preview(
        &mut self,
        token: SessionToken,
        step: Step,
        file: SelectedFile,
        preview_data_url: String,
        description: &str,
    ) -> Option<PendingId> {
        let session = self.session.as_mut().filter(|s| s.token == token)?;
        let id = PendingId::generate();
        debug!(file = %file.name, step = %step, id = %id, "Staged upload");
        session.pending_uploads.push(PendingUpload {
            id,
            step,
            file,
            preview_data_url,
            description: description.to_string(),
        });
        Some(id)
    }

    /// Pending uploads are simply dropped; existing images get a deletion
    /// mark. Repeating either is a no-op, and so is naming an image the
    /// session never loaded.
    pub fn stage_deletion(&mut self, step: Step, image: &ImageRef) -> Result<DeletionEffect, PortfolioError> {
        let session = self.session.as_mut().ok_or(PortfolioError::InvalidState {
            operation: "delete images",
            state: EditorPhase::Closed.describe(),
        })?;

        let effect = match image {
            ImageRef::Pending(id) => {
                let before = session.pending_uploads.len();
                session.pending_uploads.retain(|upload| upload.id != *id);
                if session.pending_uploads.len() < before {
                    DeletionEffect::RemovedPending
                } else {
                    DeletionEffect::Unchanged
                }
            }
            ImageRef::Existing(id) => {
                let key = DeletionKey::new(step, id.clone());
                if !session.existing_images.iter().any(|image| image.deletion_key() == key) {
                    warn!(step = %step, id = %id, "Ignoring deletion of an image not in this session");
                    DeletionEffect::Unchanged
                } else if session.deletion_marks.insert(key) {
                    DeletionEffect::Marked
                } else {
                    DeletionEffect::Unchanged
                }
            }
        };
        debug!(step = %step, image = %image, effect = ?effect, "Staged deletion");
        Ok(effect)
    }

    pub fn render(&self) -> GalleryView {
        match &self.session {
            Some(session) => render_gallery(
                &session.existing_images,
                &session.pending_uploads,
                &session.deletion_marks,
                &self.render_options,
            ),
            None => GalleryView::default(),
        }
    }

    /// Builds the save request and enters `Committing`. Fails locally,
    /// without touching the network, when an id is missing, the editor is
    /// closed, or a save is already running.
    pub fn begin_commit(
        &mut self,
        task_id: Option<i64>,
        project_id: Option<i64>,
        process_text: &str,
        csrf_token: Option<&str>,
    ) -> Result<CommitTicket, PortfolioError> {
        let (task_id, project_id) = match (task_id, project_id) {
            (Some(task_id), Some(project_id)) => (task_id, project_id),
            (None, None) => {
                return Err(PortfolioError::validation(
                    "task",
                    "Task and project information is missing; refresh the page and try again",
                ));
            }
            (None, Some(_)) => {
                return Err(PortfolioError::validation(
                    "task",
                    "Task information is missing; refresh the page and try again",
                ));
            }
            (Some(_), None) => {
                return Err(PortfolioError::validation(
                    "project",
                    "Project information is missing; refresh the page and try again",
                ));
            }
        };

        let phase = self.phase();
        let session = match self.session.as_mut() {
            Some(session) if !session.committing => session,
            _ => {
                return Err(PortfolioError::InvalidState {
                    operation: "save",
                    state: phase.describe(),
                });
            }
        };

        if csrf_token.is_none() {
            warn!("No CSRF token on the page; the save will likely be refused");
        }

        let uploads = session
            .pending_uploads
            .iter()
            .enumerate()
            .map(|(ordinal, upload)| UploadField {
                image_field: format!("step_image_{}_{}", upload.step, ordinal),
                description_field: format!("step_description_{}_{}", upload.step, ordinal),
                file: upload.file.clone(),
                description: upload.description.clone(),
            })
            .collect();

        let form = ProcessUpdateForm {
            process: process_text.trim().to_string(),
            csrf_token: csrf_token.map(str::to_string),
            deletions: session.deletion_marks.iter().cloned().collect(),
            uploads,
        };

        session.committing = true;
        info!(
            task_id,
            project_id,
            deletions = form.deletions.len(),
            uploads = form.uploads.len(),
            "Saving process changes"
        );

        Ok(CommitTicket {
            token: session.token,
            project_id,
            task_id,
            form,
        })
    }

    /// Applies the server's answer to the session the ticket came from.
    pub fn finish_commit(
        &mut self,
        ticket: &CommitTicket,
        result: Result<UpdateProcessResponse, PortfolioError>,
    ) -> CommitOutcome {
        if !self.is_current(ticket.token) {
            debug!("Ignoring save response for a closed session");
            return CommitOutcome::Stale;
        }

        let failure = match result {
            Ok(response) if response.is_success() => {
                self.close_session();
                return CommitOutcome::Saved {
                    redirect_url: ClientConfig::task_detail_path(ticket.project_id, ticket.task_id),
                };
            }
            Ok(response) => PortfolioError::transport(
                None,
                response.message.unwrap_or_else(|| "Save failed".to_string()),
            ),
            Err(PortfolioError::Transport { status: Some(code), .. }) if !(200..300).contains(&code) => {
                PortfolioError::transport(Some(code), format!("Save failed (HTTP {})", code))
            }
            Err(PortfolioError::Transport { status: Some(code), message }) => {
                PortfolioError::transport(Some(code), format!("Save failed: {}", message))
            }
            Err(PortfolioError::Transport { status: None, message }) => {
                PortfolioError::transport(None, format!("Save failed: {}", message))
            }
            Err(e) => e,
        };

        LogHelper::log_transport_failure("update_process", &failure);
        if let Some(session) = self.session.as_mut() {
            session.committing = false;
        }
        CommitOutcome::Failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gallery::DeleteTarget;

    fn step(n: u32) -> Step {
        Step::new(n).unwrap()
    }

    fn png(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/png", vec![0; 8])
    }

    fn task() -> TaskDescriptor {
        TaskDescriptor::new(7, "measure\ncut\nsand").with_images(vec![
            StepImage::new("1", step(1), "a.png"),
            StepImage::new("2", step(3), "b.png"),
        ])
    }

    fn stage(editor: &mut StagingEditor, n: u32, name: &str) -> PendingId {
        let batch = editor.prepare_upload(Some(step(n)), vec![png(name)], "desc").unwrap();
        let file = batch.accepted.into_iter().next().unwrap();
        editor
            .accept_preview(batch.token, batch.step, file, "data:,".to_string(), &batch.description)
            .unwrap()
    }

    #[test]
    fn test_open_resets_state() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        assert_eq!(editor.phase(), EditorPhase::Closed);

        editor.open_session(&task());
        stage(&mut editor, 1, "x.png");
        editor.stage_deletion(step(1), &ImageRef::Existing("1".into())).unwrap();

        editor.open_session(&task());
        assert_eq!(editor.phase(), EditorPhase::Open);
        assert!(editor.pending_uploads().is_empty());
        assert!(editor.deletion_marks().is_empty());
        assert_eq!(editor.step_options(), &[step(1), step(2), step(3)]);
    }

    #[test]
    fn test_set_process_text_regenerates_steps() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        editor.set_process_text("only one");
        assert_eq!(editor.step_options(), &[step(1)]);
    }

    #[test]
    fn test_prepare_upload_requires_step_and_files() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        assert!(matches!(
            editor.prepare_upload(Some(step(1)), vec![png("a.png")], ""),
            Err(PortfolioError::InvalidState { .. })
        ));

        editor.open_session(&task());
        assert!(matches!(
            editor.prepare_upload(None, vec![png("a.png")], ""),
            Err(PortfolioError::Validation { field: "step", .. })
        ));
        assert!(matches!(
            editor.prepare_upload(Some(step(1)), vec![], ""),
            Err(PortfolioError::Validation { field: "files", .. })
        ));
    }

    #[test]
    fn test_stale_preview_ignored() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        let batch = editor.prepare_upload(Some(step(1)), vec![png("a.png")], "").unwrap();

        editor.close_session();
        editor.open_session(&task());

        let file = batch.accepted.into_iter().next().unwrap();
        assert!(editor.accept_preview(batch.token, batch.step, file, "data:,".into(), "").is_none());
        assert!(editor.pending_uploads().is_empty());
    }

    #[test]
    fn test_deleting_pending_never_marks() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        let id = stage(&mut editor, 2, "x.png");

        let effect = editor.stage_deletion(step(2), &ImageRef::Pending(id)).unwrap();
        assert_eq!(effect, DeletionEffect::RemovedPending);
        assert!(editor.pending_uploads().is_empty());
        assert!(editor.deletion_marks().is_empty());

        let again = editor.stage_deletion(step(2), &ImageRef::Pending(id)).unwrap();
        assert_eq!(again, DeletionEffect::Unchanged);
    }

    #[test]
    fn test_marking_is_idempotent() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        let image = ImageRef::Existing("2".into());

        assert_eq!(editor.stage_deletion(step(3), &image).unwrap(), DeletionEffect::Marked);
        assert_eq!(editor.stage_deletion(step(3), &image).unwrap(), DeletionEffect::Unchanged);
        assert_eq!(editor.deletion_marks(), vec![DeletionKey::new(step(3), "2")]);

        let view = editor.render();
        assert!(!view.contains(&DeleteTarget { step: step(3), image }));
        assert_eq!(view.image_count, 1);
    }

    #[test]
    fn test_commit_form_ordinals_never_collide() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        stage(&mut editor, 2, "a.png");
        stage(&mut editor, 2, "b.png");
        stage(&mut editor, 1, "c.png");
        editor.stage_deletion(step(1), &ImageRef::Existing("1".into())).unwrap();

        let ticket = editor
            .begin_commit(Some(7), Some(3), "  measure\ncut  ", Some("tok"))
            .unwrap();

        assert_eq!(ticket.form.process, "measure\ncut");
        assert_eq!(ticket.form.file_field_names(), vec!["step_image_2_0", "step_image_2_1", "step_image_1_2"]);
        assert_eq!(ticket.form.deletions, vec![DeletionKey::new(step(1), "1")]);
        assert_eq!(ticket.form.uploads[1].description_field, "step_description_2_1");
        assert_eq!(editor.phase(), EditorPhase::Committing);
    }

    #[test]
    fn test_commit_missing_ids() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());

        let err = editor.begin_commit(None, Some(3), "", None).unwrap_err();
        assert!(err.to_string().starts_with("Task information"));
        let err = editor.begin_commit(Some(7), None, "", None).unwrap_err();
        assert!(err.to_string().starts_with("Project information"));
        let err = editor.begin_commit(None, None, "", None).unwrap_err();
        assert!(err.to_string().starts_with("Task and project"));
        assert_eq!(editor.phase(), EditorPhase::Open);
    }

    #[test]
    fn test_second_commit_rejected_while_saving() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        editor.begin_commit(Some(7), Some(3), "x", None).unwrap();

        assert!(matches!(
            editor.begin_commit(Some(7), Some(3), "x", None),
            Err(PortfolioError::InvalidState { operation: "save", state: "saving" })
        ));
        // Staging still works during a save.
        stage(&mut editor, 1, "late.png");
        assert_eq!(editor.pending_uploads().len(), 1);
    }

    #[test]
    fn test_failed_commit_keeps_state() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        stage(&mut editor, 1, "a.png");
        let ticket = editor.begin_commit(Some(7), Some(3), "x", None).unwrap();

        let outcome = editor.finish_commit(&ticket, Err(PortfolioError::transport(Some(500), "HTTP 500")));
        assert_eq!(
            outcome,
            CommitOutcome::Failed(PortfolioError::transport(Some(500), "Save failed (HTTP 500)"))
        );
        assert_eq!(editor.phase(), EditorPhase::Open);
        assert_eq!(editor.pending_uploads().len(), 1);

        let retry = editor.begin_commit(Some(7), Some(3), "x", None).unwrap();
        let outcome = editor.finish_commit(&retry, Ok(UpdateProcessResponse::error("Disk full")));
        assert_eq!(outcome, CommitOutcome::Failed(PortfolioError::transport(None, "Disk full")));
    }

    #[test]
    fn test_successful_commit_closes_session() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        let ticket = editor.begin_commit(Some(7), Some(3), "x", None).unwrap();

        let outcome = editor.finish_commit(&ticket, Ok(UpdateProcessResponse::success()));
        assert_eq!(outcome, CommitOutcome::Saved { redirect_url: "/projects/3/tasks/7/".to_string() });
        assert_eq!(editor.phase(), EditorPhase::Closed);
    }

    #[test]
    fn test_response_after_reopen_is_stale() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        let ticket = editor.begin_commit(Some(7), Some(3), "x", None).unwrap();

        editor.close_session();
        editor.open_session(&task());
        stage(&mut editor, 1, "new.png");

        let outcome = editor.finish_commit(&ticket, Ok(UpdateProcessResponse::success()));
        assert_eq!(outcome, CommitOutcome::Stale);
        assert_eq!(editor.phase(), EditorPhase::Open);
        assert_eq!(editor.pending_uploads().len(), 1);
    }

    #[test]
    fn test_upload_to_removed_step_rejected() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        editor.set_process_text("only one");

        assert!(matches!(
            editor.prepare_upload(Some(step(3)), vec![png("x.png")], ""),
            Err(PortfolioError::Validation { field: "step", .. })
        ));
        assert!(editor.prepare_upload(Some(step(1)), vec![png("x.png")], "").is_ok());

        let ticket = editor.begin_commit(Some(7), Some(3), "only one", None).unwrap();
        assert!(ticket.form.uploads.is_empty());
    }

    #[test]
    fn test_unknown_image_never_marked() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());

        let wrong_step = editor.stage_deletion(step(2), &ImageRef::Existing("1".into())).unwrap();
        let unknown_id = editor.stage_deletion(step(1), &ImageRef::Existing("missing".into())).unwrap();

        assert_eq!(wrong_step, DeletionEffect::Unchanged);
        assert_eq!(unknown_id, DeletionEffect::Unchanged);
        assert!(editor.deletion_marks().is_empty());
        assert_eq!(editor.render().image_count, 2);

        let ticket = editor.begin_commit(Some(7), Some(3), "x", None).unwrap();
        assert!(ticket.form.deletions.is_empty());
    }

    #[test]
    fn test_unreadable_success_body_keeps_cause() {
        let mut editor = StagingEditor::new(&ClientConfig::default());
        editor.open_session(&task());
        let ticket = editor.begin_commit(Some(7), Some(3), "x", None).unwrap();

        let outcome = editor.finish_commit(
            &ticket,
            Err(PortfolioError::transport(Some(200), "Unreadable response: expected value")),
        );
        assert_eq!(
            outcome,
            CommitOutcome::Failed(PortfolioError::transport(
                Some(200),
                "Save failed: Unreadable response: expected value"
            ))
        );
    }
}
