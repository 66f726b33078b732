pub mod contact_form;
pub mod delete_task_modal;
pub mod process_edit_modal;
pub mod process_steps;
pub mod project_filter;
pub mod step_image_gallery;
pub mod toast;
pub mod upload_progress;

pub use contact_form::ContactForm;
pub use delete_task_modal::DeleteTaskModal;
pub use process_edit_modal::ProcessEditModal;
pub use process_steps::ProcessSteps;
pub use project_filter::ProjectFilter;
pub use step_image_gallery::StepImageGallery;
pub use toast::Toast;
pub use upload_progress::UploadProgress;
