pub mod alert_store;
pub mod alert_store_state;
pub mod dto;
pub mod upstream_queries;
