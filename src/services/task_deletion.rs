use crate::config::ClientConfig;
use crate::services::editor_handle::Navigator;
use crate::services::error_handling::{LogHelper, Notice, PortfolioError};
use crate::services::portfolio_api::PortfolioApi;
use std::cell::Cell;
use std::rc::Rc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    Idle,
    Confirming,
    Deleting,
}

/// Confirm-then-delete flow for the task detail page.
#[derive(Clone)]
pub struct TaskDeletionFlow {
    phase: Rc<Cell<DeletePhase>>,
    api: Rc<dyn PortfolioApi>,
    navigator: Rc<dyn Navigator>,
    config: Rc<ClientConfig>,
}

impl TaskDeletionFlow {
    pub fn new(config: &ClientConfig, api: Rc<dyn PortfolioApi>, navigator: Rc<dyn Navigator>) -> Self {
        Self {
            phase: Rc::new(Cell::new(DeletePhase::Idle)),
            api,
            navigator,
            config: Rc::new(config.clone()),
        }
    }

    pub fn phase(&self) -> DeletePhase {
        self.phase.get()
    }

    pub fn is_modal_open(&self) -> bool {
        self.phase.get() != DeletePhase::Idle
    }

    pub fn open(&self) {
        if self.phase.get() == DeletePhase::Idle {
            self.phase.set(DeletePhase::Confirming);
        }
    }

    /// Cancel button, Escape or a backdrop click. Ignored while the request
    /// is running.
    pub fn dismiss(&self) {
        if self.phase.get() == DeletePhase::Confirming {
            self.phase.set(DeletePhase::Idle);
        }
    }

    pub async fn confirm(&self, task_id: Option<i64>, csrf_token: Option<&str>) -> Result<Notice, PortfolioError> {
        if self.phase.get() != DeletePhase::Confirming {
            return Err(PortfolioError::InvalidState {
                operation: "delete the task",
                state: match self.phase.get() {
                    DeletePhase::Deleting => "deleting",
                    _ => "closed",
                },
            });
        }
        let task_id = task_id.ok_or_else(|| PortfolioError::validation("task", "Could not determine the task ID"))?;

        self.phase.set(DeletePhase::Deleting);
        let result = self.api.delete_task(task_id, csrf_token.map(str::to_string)).await;

        let failure = match result {
            Ok(response) if response.success => {
                self.phase.set(DeletePhase::Idle);
                info!(task_id, "Task deleted");
                self.navigator
                    .navigate_after(self.config.task_list_path.clone(), self.config.delete_redirect_delay());
                return Ok(Notice::success("Task deleted"));
            }
            Ok(response) => PortfolioError::transport(
                None,
                response.message.unwrap_or_else(|| "Failed to delete the task".to_string()),
            ),
            Err(PortfolioError::Transport { status: Some(code), .. }) => {
                PortfolioError::transport(Some(code), format!("Failed to delete the task (HTTP {})", code))
            }
            Err(_) => PortfolioError::transport(None, "Network error, please try again later"),
        };

        LogHelper::log_transport_failure("delete_task", &failure);
        self.phase.set(DeletePhase::Confirming);
        Err(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::editor_handle::MockNavigator;
    use crate::services::portfolio_api::DeleteTaskResponse;
    use crate::test_helpers::RecordingApi;
    use std::time::Duration;

    fn flow(api: Rc<RecordingApi>, navigator: MockNavigator) -> TaskDeletionFlow {
        TaskDeletionFlow::new(&ClientConfig::default(), api, Rc::new(navigator))
    }

    #[tokio::test]
    async fn test_success_redirects_to_task_list() {
        let api = Rc::new(RecordingApi::default());
        api.push_delete_response(Ok(DeleteTaskResponse { success: true, message: None }));
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate_after()
            .withf(|url, delay| url == "/portfolio/tasks/" && *delay == Duration::from_millis(1500))
            .times(1)
            .return_const(());

        let flow = flow(api.clone(), navigator);
        flow.open();
        let notice = flow.confirm(Some(4), Some("tok")).await.unwrap();

        assert_eq!(notice, Notice::success("Task deleted"));
        assert_eq!(flow.phase(), DeletePhase::Idle);
        assert_eq!(api.delete_requests(), vec![(4, Some("tok".to_string()))]);
    }

    #[tokio::test]
    async fn test_missing_task_id_sends_nothing() {
        let api = Rc::new(RecordingApi::default());
        let flow = flow(api.clone(), MockNavigator::new());
        flow.open();

        let err = flow.confirm(None, Some("tok")).await.unwrap_err();
        assert!(matches!(err, PortfolioError::Validation { field: "task", .. }));
        assert!(api.delete_requests().is_empty());
        assert_eq!(flow.phase(), DeletePhase::Confirming);
    }

    #[tokio::test]
    async fn test_refusal_keeps_modal_open() {
        let api = Rc::new(RecordingApi::default());
        api.push_delete_response(Ok(DeleteTaskResponse {
            success: false,
            message: Some("Task has running work".to_string()),
        }));
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate_after().times(0);

        let flow = flow(api, navigator);
        flow.open();
        let err = flow.confirm(Some(4), None).await.unwrap_err();

        assert_eq!(err.to_string(), "Task has running work");
        assert_eq!(flow.phase(), DeletePhase::Confirming);
    }

    #[test]
    fn test_dismiss_only_from_confirming() {
        let flow = flow(Rc::new(RecordingApi::default()), MockNavigator::new());
        flow.dismiss();
        assert_eq!(flow.phase(), DeletePhase::Idle);
        flow.open();
        assert!(flow.is_modal_open());
        flow.dismiss();
        assert!(!flow.is_modal_open());
    }
}
