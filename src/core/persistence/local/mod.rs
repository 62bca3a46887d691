pub mod filters;
pub mod json_file_adapter;
pub mod local_storage_adapter_trait;
pub mod settings;
