use crate::config::ClientConfig;
use crate::domain::contact::{ContactField, ContactForm};
use crate::domain::step_image::{ImageKind, SelectedFile};
use crate::services::error_handling::{PortfolioError, RejectReason};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Type and size gate for step images.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    accepted: Vec<ImageKind>,
    max_bytes: u64,
}

impl ImageValidator {
    pub fn new(accepted: Vec<ImageKind>, max_bytes: u64) -> Self {
        Self { accepted, max_bytes }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.accepted_image_kinds.clone(), config.max_upload_bytes)
    }

    pub fn check(&self, file: &SelectedFile) -> Result<ImageKind, PortfolioError> {
        let kind = ImageKind::from_mime(&file.mime_type)
            .filter(|kind| self.accepted.contains(kind))
            .ok_or_else(|| PortfolioError::RejectedFile {
                file_name: file.name.clone(),
                reason: RejectReason::UnsupportedType {
                    mime_type: file.mime_type.clone(),
                },
            })?;

        if file.size() > self.max_bytes {
            return Err(PortfolioError::RejectedFile {
                file_name: file.name.clone(),
                reason: RejectReason::TooLarge {
                    size: file.size(),
                    limit: self.max_bytes,
                },
            });
        }

        Ok(kind)
    }
}

/// A contact form problem, tied to the input that should get focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFieldError {
    pub field: ContactField,
    pub message: &'static str,
}

pub struct ContactValidator;

impl ContactValidator {
    /// Checks fields in form order and stops at the first failure.
    pub fn validate(form: &ContactForm) -> Result<ContactForm, ContactFieldError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(ContactFieldError {
                field: ContactField::Name,
                message: "Please enter your name",
            });
        }

        let email = form.email.trim();
        if email.is_empty() {
            return Err(ContactFieldError {
                field: ContactField::Email,
                message: "Please enter your email",
            });
        }
        if !EMAIL_PATTERN.is_match(email) {
            return Err(ContactFieldError {
                field: ContactField::Email,
                message: "Please enter a valid email address",
            });
        }

        let message = form.message.trim();
        if message.is_empty() {
            return Err(ContactFieldError {
                field: ContactField::Message,
                message: "Please enter your message",
            });
        }

        Ok(ContactForm::new(name, email, message))
    }
}

/// Project list URL for the category/technology filter selects.
pub fn project_filter_url(base_url: &str, category: &str, technology: &str) -> Result<Url, PortfolioError> {
    let mut url = Url::parse(base_url)
        .and_then(|base| base.join("/projects/"))
        .map_err(|e| PortfolioError::validation("base_url", format!("Invalid site address: {}", e)))?;

    // Values are encoded like the browser's encodeURIComponent (space as %20).
    let query: Vec<String> = [("category", category.trim()), ("technology", technology.trim())]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect();
    if !query.is_empty() {
        url.set_query(Some(&query.join("&")));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn validator() -> ImageValidator {
        ImageValidator::from_config(&ClientConfig::default())
    }

    #[rstest]
    #[case("image/jpeg")]
    #[case("image/png")]
    #[case("image/gif")]
    #[case("image/webp")]
    fn test_accepts_supported_types(#[case] mime: &str) {
        let file = SelectedFile::new("a", mime, vec![0; 16]);
        assert!(validator().check(&file).is_ok());
    }

    #[rstest]
    #[case("image/svg+xml")]
    #[case("application/pdf")]
    #[case("")]
    fn test_rejects_other_types(#[case] mime: &str) {
        let file = SelectedFile::new("a", mime, vec![0; 16]);
        let err = validator().check(&file).unwrap_err();
        assert!(matches!(
            err,
            PortfolioError::RejectedFile { reason: RejectReason::UnsupportedType { .. }, .. }
        ));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let limit = 5 * 1024 * 1024;
        let at_limit = SelectedFile::new("ok.png", "image/png", vec![0; limit]);
        let over = SelectedFile::new("big.png", "image/png", vec![0; limit + 1]);

        assert!(validator().check(&at_limit).is_ok());
        let err = validator().check(&over).unwrap_err();
        assert!(matches!(
            err,
            PortfolioError::RejectedFile { reason: RejectReason::TooLarge { .. }, .. }
        ));
    }

    #[test]
    fn test_contact_validation_order() {
        let err = ContactValidator::validate(&ContactForm::new(" ", "", "")).unwrap_err();
        assert_eq!(err.field, ContactField::Name);

        let err = ContactValidator::validate(&ContactForm::new("Li", " ", "")).unwrap_err();
        assert_eq!(err.field, ContactField::Email);

        let err = ContactValidator::validate(&ContactForm::new("Li", "li@example", "hi")).unwrap_err();
        assert_eq!(err.field, ContactField::Email);
        assert_eq!(err.message, "Please enter a valid email address");

        let err = ContactValidator::validate(&ContactForm::new("Li", "li@example.com", "")).unwrap_err();
        assert_eq!(err.field, ContactField::Message);
    }

    #[test]
    fn test_contact_validation_trims() {
        let form = ContactValidator::validate(&ContactForm::new(" Li ", " li@example.com ", " hello ")).unwrap();
        assert_eq!(form, ContactForm::new("Li", "li@example.com", "hello"));
    }

    #[test]
    fn test_project_filter_url() {
        let url = project_filter_url("http://site", "", "").unwrap();
        assert_eq!(url.as_str(), "http://site/projects/");

        let url = project_filter_url("http://site", "Embedded", "").unwrap();
        assert_eq!(url.as_str(), "http://site/projects/?category=Embedded");

        let url = project_filter_url("http://site", "web apps", "C&C++").unwrap();
        assert_eq!(url.query(), Some("category=web%20apps&technology=C%26C%2B%2B"));

        let url = project_filter_url("http://site", "", "Rust / WASM").unwrap();
        assert_eq!(url.as_str(), "http://site/projects/?technology=Rust%20%2F%20WASM");
    }
}
