pub mod filter_codec;
pub mod filter_entity;
pub mod location;
pub mod service;
