use crate::config::ClientConfig;
use crate::domain::step_image::{DeletionKey, SelectedFile};
use crate::services::error_handling::PortfolioError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub const PROCESS_FIELD: &str = "process";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";
pub const DELETE_FIELD: &str = "delete_step_image[]";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// One staged upload as it goes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadField {
    pub image_field: String,
    pub description_field: String,
    pub file: SelectedFile,
    pub description: String,
}

/// Body of the update-process request: new process text plus the staged
/// image diff.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessUpdateForm {
    pub process: String,
    pub csrf_token: Option<String>,
    pub deletions: Vec<DeletionKey>,
    pub uploads: Vec<UploadField>,
}

impl ProcessUpdateForm {
    /// All non-file fields in the order they are sent.
    pub fn text_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![(PROCESS_FIELD.to_string(), self.process.clone())];
        if let Some(token) = &self.csrf_token {
            fields.push((CSRF_FIELD.to_string(), token.clone()));
        }
        fields.extend(
            self.deletions
                .iter()
                .map(|key| (DELETE_FIELD.to_string(), key.form_value())),
        );
        fields.extend(
            self.uploads
                .iter()
                .map(|upload| (upload.description_field.clone(), upload.description.clone())),
        );
        fields
    }

    pub fn file_field_names(&self) -> Vec<&str> {
        self.uploads.iter().map(|u| u.image_field.as_str()).collect()
    }

    fn into_multipart(self) -> Result<Form, PortfolioError> {
        let mut form = Form::new();
        for (name, value) in self.text_fields() {
            form = form.text(name, value);
        }
        for upload in self.uploads {
            let part = Part::bytes(upload.file.bytes.as_ref().clone())
                .file_name(upload.file.name.clone())
                .mime_str(&upload.file.mime_type)
                .map_err(|e| PortfolioError::validation("file", format!("{}: {}", upload.file.name, e)))?;
            form = form.part(upload.image_field, part);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProcessResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub steps_count: Option<u32>,
}

impl UpdateProcessResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            steps_count: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
            steps_count: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTaskResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// The two write endpoints of the portfolio backend.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PortfolioApi {
    async fn update_process(
        &self,
        project_id: i64,
        task_id: i64,
        form: ProcessUpdateForm,
    ) -> Result<UpdateProcessResponse, PortfolioError>;

    async fn delete_task(
        &self,
        task_id: i64,
        csrf_token: Option<String>,
    ) -> Result<DeleteTaskResponse, PortfolioError>;
}

#[derive(Clone)]
pub struct PortfolioClient {
    http: reqwest::Client,
    base_url: String,
}

impl PortfolioClient {
    pub fn new(config: &ClientConfig) -> Result<Self, PortfolioError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.request_timeout());
        let http = builder
            .build()
            .map_err(|e| PortfolioError::transport(None, format!("Could not create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn update_process_url(&self, project_id: i64, task_id: i64) -> String {
        format!("{}/projects/{}/tasks/{}/update-process/", self.base_url, project_id, task_id)
    }

    pub fn delete_task_url(&self, task_id: i64) -> String {
        format!("{}/portfolio/task/{}/delete/", self.base_url, task_id)
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, PortfolioError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "Backend returned an error page");
            return Err(PortfolioError::transport(
                Some(status.as_u16()),
                format!("HTTP {}", status.as_u16()),
            ));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| PortfolioError::transport(Some(status.as_u16()), format!("Unreadable response: {}", e)))
    }
}

fn network_error(e: reqwest::Error) -> PortfolioError {
    PortfolioError::transport(e.status().map(|s| s.as_u16()), format!("Network error: {}", e))
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PortfolioApi for PortfolioClient {
    #[instrument(skip(self, form), fields(deletions = form.deletions.len(), uploads = form.uploads.len()))]
    async fn update_process(
        &self,
        project_id: i64,
        task_id: i64,
        form: ProcessUpdateForm,
    ) -> Result<UpdateProcessResponse, PortfolioError> {
        let url = self.update_process_url(project_id, task_id);
        let body = form.into_multipart()?;
        info!(url = %url, "Submitting process update");

        let response = self
            .http
            .post(&url)
            .multipart(body)
            .send()
            .await
            .map_err(network_error)?;
        Self::read_json(response).await
    }

    #[instrument(skip(self, csrf_token))]
    async fn delete_task(
        &self,
        task_id: i64,
        csrf_token: Option<String>,
    ) -> Result<DeleteTaskResponse, PortfolioError> {
        let url = self.delete_task_url(task_id);
        info!(url = %url, "Deleting task");

        let mut request = self.http.post(&url).json(&serde_json::json!({}));
        if let Some(token) = csrf_token {
            request = request.header(CSRF_HEADER, token);
        }
        let response = request.send().await.map_err(network_error)?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::step_image::Step;

    fn step(n: u32) -> Step {
        Step::new(n).unwrap()
    }

    #[test]
    fn test_text_fields_order() {
        let form = ProcessUpdateForm {
            process: "a\nb".to_string(),
            csrf_token: Some("tok".to_string()),
            deletions: vec![DeletionKey::new(step(2), "5")],
            uploads: vec![UploadField {
                image_field: "step_image_1_0".to_string(),
                description_field: "step_description_1_0".to_string(),
                file: SelectedFile::new("a.png", "image/png", vec![1, 2, 3]),
                description: "first".to_string(),
            }],
        };

        assert_eq!(
            form.text_fields(),
            vec![
                ("process".to_string(), "a\nb".to_string()),
                ("csrfmiddlewaretoken".to_string(), "tok".to_string()),
                ("delete_step_image[]".to_string(), "2_5".to_string()),
                ("step_description_1_0".to_string(), "first".to_string()),
            ]
        );
        assert_eq!(form.file_field_names(), vec!["step_image_1_0"]);
    }

    #[test]
    fn test_form_without_csrf_token() {
        let form = ProcessUpdateForm {
            process: "x".to_string(),
            ..Default::default()
        };
        assert_eq!(form.text_fields().len(), 1);
    }

    #[test]
    fn test_endpoint_urls() {
        let client = PortfolioClient::new(&ClientConfig::default().with_base_url("http://site/")).unwrap();
        assert_eq!(client.update_process_url(3, 7), "http://site/projects/3/tasks/7/update-process/");
        assert_eq!(client.delete_task_url(7), "http://site/portfolio/task/7/delete/");
    }

    #[test]
    fn test_response_parsing() {
        let ok: UpdateProcessResponse =
            serde_json::from_str(r#"{"status": "success", "message": "done", "steps_count": 3}"#).unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.steps_count, Some(3));

        let failed: UpdateProcessResponse = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert!(!failed.is_success());
        assert_eq!(failed.message, None);

        let deleted: DeleteTaskResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(deleted.success);
    }
}
