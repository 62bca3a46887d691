use std::path::Path;

use crate::core::persistence::local::json_file_adapter::JsonFileAdapter;
use crate::core::persistence::local::local_storage_adapter_trait::LocalStorageAdapterTrait;
use crate::core::persistence::storage_path::{
    fetch_config_path, grid_config_path, multi_grid_config_path, silence_form_config_path,
};

use super::ui_settings_api_repository_trait::UiSettingsApiRepository;
use super::ui_settings_entity::{
    FetchConfigEntity, GridConfigEntity, MultiGridConfigEntity, SilenceFormConfigEntity,
};

pub struct UiSettingsRepository {
    fetch: JsonFileAdapter<FetchConfigEntity>,
    grid: JsonFileAdapter<GridConfigEntity>,
    multi_grid: JsonFileAdapter<MultiGridConfigEntity>,
    silence_form: JsonFileAdapter<SilenceFormConfigEntity>,
}

impl UiSettingsRepository {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            fetch: JsonFileAdapter::new(fetch_config_path(data_dir)),
            grid: JsonFileAdapter::new(grid_config_path(data_dir)),
            multi_grid: JsonFileAdapter::new(multi_grid_config_path(data_dir)),
            silence_form: JsonFileAdapter::new(silence_form_config_path(data_dir)),
        }
    }
}

impl UiSettingsApiRepository for UiSettingsRepository {
    fn fetch_adapter(&self) -> &dyn LocalStorageAdapterTrait<FetchConfigEntity> {
        &self.fetch
    }

    fn grid_adapter(&self) -> &dyn LocalStorageAdapterTrait<GridConfigEntity> {
        &self.grid
    }

    fn multi_grid_adapter(&self) -> &dyn LocalStorageAdapterTrait<MultiGridConfigEntity> {
        &self.multi_grid
    }

    fn silence_form_adapter(&self) -> &dyn LocalStorageAdapterTrait<SilenceFormConfigEntity> {
        &self.silence_form
    }
}
