pub mod contact;
pub mod task_detail;

pub use contact::ContactPage;
pub use task_detail::TaskDetailPage;
