pub mod crash;
pub mod history;
pub mod notifications;
pub mod poll;
