pub mod memo;
pub mod observable;
