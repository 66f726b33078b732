pub mod task;
pub mod step_image;
pub mod contact;
