use std::path::{Path, PathBuf};

pub const FILTER_HISTORY_FILE: &str = "filters.json";
pub const SAVED_FILTERS_FILE: &str = "savedFilters.json";
pub const FETCH_CONFIG_FILE: &str = "fetchConfig.json";
pub const GRID_CONFIG_FILE: &str = "gridConfig.json";
pub const MULTI_GRID_CONFIG_FILE: &str = "multiGridConfig.json";
pub const SILENCE_FORM_CONFIG_FILE: &str = "silenceFormConfig.json";

pub fn filter_history_path(data_dir: &Path) -> PathBuf {
    data_dir.join(FILTER_HISTORY_FILE)
}

pub fn saved_filters_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SAVED_FILTERS_FILE)
}

pub fn fetch_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(FETCH_CONFIG_FILE)
}

pub fn grid_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(GRID_CONFIG_FILE)
}

pub fn multi_grid_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(MULTI_GRID_CONFIG_FILE)
}

pub fn silence_form_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SILENCE_FORM_CONFIG_FILE)
}
