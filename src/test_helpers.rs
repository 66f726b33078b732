// Test helpers for unit and integration testing

use crate::config::ClientConfig;
use crate::domain::step_image::{SelectedFile, Step, StepImage};
use crate::domain::task::TaskDescriptor;
use crate::services::editor_handle::{EditorEvent, EditorHandle, EditorServices, Navigator};
use crate::services::error_handling::{Notice, PortfolioError};
use crate::services::portfolio_api::{DeleteTaskResponse, PortfolioApi, ProcessUpdateForm, UpdateProcessResponse};
use crate::services::preview::{PreviewError, PreviewReader, encode_data_url};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub fn step(n: u32) -> Step {
    Step::new(n).expect("test steps are positive")
}

pub fn png_file(name: &str) -> SelectedFile {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.extend_from_slice(&[0; 24]);
    SelectedFile::new(name, "image/png", bytes)
}

pub fn sized_file(name: &str, mime_type: &str, size: usize) -> SelectedFile {
    SelectedFile::new(name, mime_type, vec![0; size])
}

/// A task with process text and `(step, id)` images named `img_<id>.png`.
pub fn task_with_images(id: i64, process: &str, images: &[(u32, &str)]) -> TaskDescriptor {
    TaskDescriptor::new(id, process).with_images(
        images
            .iter()
            .map(|(n, image_id)| StepImage::new(*image_id, step(*n), format!("img_{}.png", image_id)))
            .collect(),
    )
}

/// Backend fake: answers from queued responses (success when the queue is
/// empty) and records every request.
#[derive(Default)]
pub struct RecordingApi {
    update_responses: Mutex<VecDeque<Result<UpdateProcessResponse, PortfolioError>>>,
    delete_responses: Mutex<VecDeque<Result<DeleteTaskResponse, PortfolioError>>>,
    update_requests: Mutex<Vec<(i64, i64, ProcessUpdateForm)>>,
    delete_requests: Mutex<Vec<(i64, Option<String>)>>,
    latency: Mutex<Duration>,
}

impl RecordingApi {
    pub fn push_update_response(&self, response: Result<UpdateProcessResponse, PortfolioError>) {
        self.update_responses.lock().push_back(response);
    }

    pub fn push_delete_response(&self, response: Result<DeleteTaskResponse, PortfolioError>) {
        self.delete_responses.lock().push_back(response);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn update_calls(&self) -> usize {
        self.update_requests.lock().len()
    }

    pub fn update_requests(&self) -> Vec<(i64, i64, ProcessUpdateForm)> {
        self.update_requests.lock().clone()
    }

    pub fn delete_requests(&self) -> Vec<(i64, Option<String>)> {
        self.delete_requests.lock().clone()
    }
}

#[async_trait]
impl PortfolioApi for RecordingApi {
    async fn update_process(
        &self,
        project_id: i64,
        task_id: i64,
        form: ProcessUpdateForm,
    ) -> Result<UpdateProcessResponse, PortfolioError> {
        self.update_requests.lock().push((project_id, task_id, form));
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.update_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(UpdateProcessResponse::success()))
    }

    async fn delete_task(
        &self,
        task_id: i64,
        csrf_token: Option<String>,
    ) -> Result<DeleteTaskResponse, PortfolioError> {
        self.delete_requests.lock().push((task_id, csrf_token));
        self.delete_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(DeleteTaskResponse { success: true, message: None }))
    }
}

/// Preview reader with per-file delays and failures.
#[derive(Default)]
pub struct ScriptedReader {
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
}

impl ScriptedReader {
    pub fn delay(mut self, file_name: &str, delay: Duration) -> Self {
        self.delays.insert(file_name.to_string(), delay);
        self
    }

    pub fn fail_on(mut self, file_name: &str) -> Self {
        self.failures.insert(file_name.to_string());
        self
    }
}

#[async_trait]
impl PreviewReader for ScriptedReader {
    async fn read_data_url(&self, file: &SelectedFile) -> Result<String, PreviewError> {
        if let Some(delay) = self.delays.get(&file.name) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(&file.name) {
            return Err(PreviewError {
                file_name: file.name.clone(),
                message: "scripted failure".to_string(),
            });
        }
        Ok(encode_data_url(&file.mime_type, &file.bytes))
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    requests: Mutex<Vec<(String, Duration)>>,
}

impl RecordingNavigator {
    pub fn requests(&self) -> Vec<(String, Duration)> {
        self.requests.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_after(&self, url: String, delay: Duration) {
        self.requests.lock().push((url, delay));
    }
}

/// Collects everything an `EditorHandle` emits.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<EditorEvent>>>,
}

impl EventLog {
    pub fn attach(handle: &EditorHandle) -> Self {
        let log = Self::default();
        let events = log.events.clone();
        handle.set_listener(Rc::new(move |event: EditorEvent| events.borrow_mut().push(event)));
        log
    }

    pub fn events(&self) -> Vec<EditorEvent> {
        self.events.borrow().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                EditorEvent::Notice(notice) => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<(usize, usize)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                EditorEvent::UploadProgress { processed, total } => Some((*processed, *total)),
                _ => None,
            })
            .collect()
    }

    pub fn last_submit_enabled(&self) -> Option<bool> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            EditorEvent::SubmitEnabled(enabled) => Some(*enabled),
            _ => None,
        })
    }
}

/// An editor wired to fakes, plus handles on those fakes.
pub struct EditorFixture {
    pub handle: EditorHandle,
    pub api: Rc<RecordingApi>,
    pub navigator: Rc<RecordingNavigator>,
    pub events: EventLog,
}

impl EditorFixture {
    pub fn new(reader: ScriptedReader) -> Self {
        let api = Rc::new(RecordingApi::default());
        let navigator = Rc::new(RecordingNavigator::default());
        let handle = EditorHandle::new(
            ClientConfig::default(),
            EditorServices {
                api: api.clone(),
                reader: Rc::new(reader),
                navigator: navigator.clone(),
            },
        );
        let events = EventLog::attach(&handle);
        Self {
            handle,
            api,
            navigator,
            events,
        }
    }
}
