pub mod dto;
pub mod matcher_util;
pub mod service;
pub mod silence_form_entity;
pub mod silence_form_store;
