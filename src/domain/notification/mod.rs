pub mod notification_entity;
pub mod notification_manager;
pub mod notification_store;
