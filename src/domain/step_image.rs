use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// A 1-based process step number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Step(u32);

impl Step {
    pub fn new(number: u32) -> Option<Self> {
        if number >= 1 { Some(Self(number)) } else { None }
    }

    /// Step for a 0-based line index of the process text.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    pub fn first() -> Self {
        Self(1)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Parses a step the way the hosting page's `parseInt` did: leading
    /// integer prefix of the trimmed text, anything after it ignored.
    pub fn parse_lenient(text: &str) -> Option<Self> {
        let trimmed = text.trim_start();
        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let end = digits
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(digits.len());
        if end == 0 || negative {
            return None;
        }
        digits[..end].parse::<u32>().ok().and_then(Self::new)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An image already persisted on the server for one process step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepImage {
    pub id: String,
    pub step: Step,
    pub url: String,
    pub description: String,
}

impl StepImage {
    pub fn new(id: impl Into<String>, step: Step, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            step,
            url: url.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn deletion_key(&self) -> DeletionKey {
        DeletionKey::new(self.step, self.id.clone())
    }
}

/// Client-generated identifier of a staged upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingId(Uuid);

impl PendingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pending_{}", self.0)
    }
}

/// Reference to a thumbnail in the working set. Pending and persisted
/// images live in separate id spaces, so a pending id can never be marked
/// for server-side deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageRef {
    Existing(String),
    Pending(PendingId),
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Existing(id) => write!(f, "{}", id),
            ImageRef::Pending(id) => write!(f, "{}", id),
        }
    }
}

/// `(step, id)` key of an existing image flagged for removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeletionKey {
    pub step: Step,
    pub image_id: String,
}

impl DeletionKey {
    pub fn new(step: Step, image_id: impl Into<String>) -> Self {
        Self {
            step,
            image_id: image_id.into(),
        }
    }

    /// Value sent in the `delete_step_image[]` form field.
    pub fn form_value(&self) -> String {
        format!("{}_{}", self.step, self.image_id)
    }
}

/// Image formats accepted for step uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    pub const ALL: [ImageKind; 4] = [ImageKind::Jpeg, ImageKind::Png, ImageKind::Gif, ImageKind::Webp];

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.mime_type().eq_ignore_ascii_case(mime.trim()))
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            image::ImageFormat::Png => Some(ImageKind::Png),
            image::ImageFormat::Gif => Some(ImageKind::Gif),
            image::ImageFormat::WebP => Some(ImageKind::Webp),
            _ => None,
        }
    }

    fn from_extension(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "gif" => Some(ImageKind::Gif),
            "webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }
}

/// A file picked by the user, held in memory until commit.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<Vec<u8>>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Builds a file when the picker only reports a name: the MIME type is
    /// sniffed from the content, then guessed from the extension.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = ImageKind::sniff(&bytes)
            .or_else(|| ImageKind::from_extension(&name))
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Self::new(name, mime_type, bytes)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// An accepted file waiting for the next save.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    pub id: PendingId,
    pub step: Step,
    pub file: SelectedFile,
    pub preview_data_url: String,
    pub description: String,
}

/// Resolves a stored image path for the editor gallery: bare relative
/// paths live under the media prefix.
pub fn editor_image_url(raw: &str, media_prefix: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || is_rooted(raw) {
        return raw.to_string();
    }
    format!("{}/{}", media_prefix.trim_end_matches('/'), raw)
}

/// Resolves a stored image path for the task detail page against the page
/// origin.
pub fn detail_image_url(raw: &str, origin: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with("data:") {
        return raw.to_string();
    }
    let path = if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{}", raw)
    };
    format!("{}{}", origin.trim_end_matches('/'), path)
}

fn is_rooted(url: &str) -> bool {
    url.starts_with("http") || url.starts_with("data:") || url.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_parse_lenient() {
        assert_eq!(Step::parse_lenient("3"), Step::new(3));
        assert_eq!(Step::parse_lenient(" 12abc"), Step::new(12));
        assert_eq!(Step::parse_lenient("+4"), Step::new(4));
        assert_eq!(Step::parse_lenient("0"), None);
        assert_eq!(Step::parse_lenient("-2"), None);
        assert_eq!(Step::parse_lenient("abc"), None);
        assert_eq!(Step::parse_lenient(""), None);
    }

    #[test]
    fn test_deletion_key_form_value() {
        let key = DeletionKey::new(Step::new(2).unwrap(), "5");
        assert_eq!(key.form_value(), "2_5");
    }

    #[test]
    fn test_pending_ids_are_unique() {
        let a = PendingId::generate();
        let b = PendingId::generate();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("pending_"));
    }

    #[test]
    fn test_mime_detection() {
        let png = SelectedFile::from_bytes("shot.bin", b"\x89PNG\r\n\x1a\n0000".to_vec());
        assert_eq!(png.mime_type, "image/png");

        let by_extension = SelectedFile::from_bytes("photo.JPG", vec![0, 1, 2]);
        assert_eq!(by_extension.mime_type, "image/jpeg");

        let unknown = SelectedFile::from_bytes("notes.txt", b"hello".to_vec());
        assert_eq!(unknown.mime_type, "application/octet-stream");
    }

    #[test]
    fn test_editor_image_url() {
        assert_eq!(editor_image_url("task_step_images/a.png", "/media/"), "/media/task_step_images/a.png");
        assert_eq!(editor_image_url("/static/a.png", "/media/"), "/static/a.png");
        assert_eq!(editor_image_url("https://cdn/a.png", "/media/"), "https://cdn/a.png");
        assert_eq!(editor_image_url("data:image/png;base64,AA", "/media/"), "data:image/png;base64,AA");
    }

    #[test]
    fn test_detail_image_url() {
        assert_eq!(detail_image_url("media/a.png", "http://site"), "http://site/media/a.png");
        assert_eq!(detail_image_url("/media/a.png", "http://site/"), "http://site/media/a.png");
        assert_eq!(detail_image_url("https://cdn/a.png", "http://site"), "https://cdn/a.png");
    }
}
