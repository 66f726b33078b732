use crate::domain::step_image::SelectedFile;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to read {file_name}: {message}")]
pub struct PreviewError {
    pub file_name: String,
    pub message: String,
}

/// Turns a selected file into something an `<img>` can show before upload.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PreviewReader {
    async fn read_data_url(&self, file: &SelectedFile) -> Result<String, PreviewError>;
}

/// Base64 `data:` URL previews.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlReader;

pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, B64.encode(bytes))
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait]
impl PreviewReader for DataUrlReader {
    async fn read_data_url(&self, file: &SelectedFile) -> Result<String, PreviewError> {
        let bytes = file.bytes.clone();
        let mime_type = file.mime_type.clone();
        // Encoding a few MB is CPU work; keep it off the UI thread.
        tokio::task::spawn_blocking(move || encode_data_url(&mime_type, &bytes))
            .await
            .map_err(|e| PreviewError {
                file_name: file.name.clone(),
                message: e.to_string(),
            })
    }
}

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl PreviewReader for DataUrlReader {
    async fn read_data_url(&self, file: &SelectedFile) -> Result<String, PreviewError> {
        Ok(encode_data_url(&file.mime_type, &file.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_data_url() {
        assert_eq!(encode_data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn test_data_url_reader() {
        let file = SelectedFile::new("a.gif", "image/gif", b"GIF89a".to_vec());
        let url = DataUrlReader.read_data_url(&file).await.unwrap();
        assert_eq!(url, "data:image/gif;base64,R0lGODlh");
    }
}
