pub mod ui_settings_store;
