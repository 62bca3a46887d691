pub mod alert;
pub mod bootstrap;
pub mod filter;
pub mod notification;
pub mod settings;
pub mod silence;
