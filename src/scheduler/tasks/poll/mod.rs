pub mod sort_settings;
pub mod task;
