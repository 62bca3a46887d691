pub mod silence_delete_service;
pub mod silence_submit_service;
