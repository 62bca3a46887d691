pub mod ui_settings_api_repository_trait;
pub mod ui_settings_entity;
pub mod ui_settings_repository;
