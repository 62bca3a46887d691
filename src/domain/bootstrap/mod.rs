pub mod crash_guard;
pub mod settings_element;
