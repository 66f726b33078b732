pub mod editor_handle;
pub mod error_handling;
pub mod gallery;
pub mod portfolio_api;
pub mod preview;
pub mod staging;
pub mod step_content;
pub mod task_deletion;
pub mod validation;

pub use editor_handle::{EditorEvent, EditorHandle, EditorServices, Navigator};
pub use portfolio_api::{PortfolioApi, PortfolioClient};
pub use preview::{DataUrlReader, PreviewReader};
pub use staging::StagingEditor;
pub use task_deletion::TaskDeletionFlow;
