pub mod filter_history_api_repository_trait;
pub mod filter_history_entity;
pub mod filter_history_repository;
pub mod saved_filters_api_repository_trait;
pub mod saved_filters_entity;
