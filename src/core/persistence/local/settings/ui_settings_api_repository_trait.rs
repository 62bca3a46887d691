use anyhow::Result;

use crate::core::persistence::local::local_storage_adapter_trait::LocalStorageAdapterTrait;

use super::ui_settings_entity::{
    FetchConfigEntity, GridConfigEntity, MultiGridConfigEntity, SilenceFormConfigEntity,
};

/// Per-user UI preferences, each stored under its own key.
pub trait UiSettingsApiRepository: Send + Sync {
    fn fetch_adapter(&self) -> &dyn LocalStorageAdapterTrait<FetchConfigEntity>;
    fn grid_adapter(&self) -> &dyn LocalStorageAdapterTrait<GridConfigEntity>;
    fn multi_grid_adapter(&self) -> &dyn LocalStorageAdapterTrait<MultiGridConfigEntity>;
    fn silence_form_adapter(&self) -> &dyn LocalStorageAdapterTrait<SilenceFormConfigEntity>;

    fn read_fetch_config(&self) -> Result<FetchConfigEntity> {
        self.fetch_adapter().read()
    }

    fn update_fetch_config(&self, cfg: &FetchConfigEntity) -> Result<()> {
        self.fetch_adapter().update(cfg)
    }

    fn read_grid_config(&self) -> Result<GridConfigEntity> {
        self.grid_adapter().read()
    }

    fn update_grid_config(&self, cfg: &GridConfigEntity) -> Result<()> {
        self.grid_adapter().update(cfg)
    }

    fn read_multi_grid_config(&self) -> Result<MultiGridConfigEntity> {
        self.multi_grid_adapter().read()
    }

    fn update_multi_grid_config(&self, cfg: &MultiGridConfigEntity) -> Result<()> {
        self.multi_grid_adapter().update(cfg)
    }

    fn read_silence_form_config(&self) -> Result<SilenceFormConfigEntity> {
        self.silence_form_adapter().read()
    }

    fn update_silence_form_config(&self, cfg: &SilenceFormConfigEntity) -> Result<()> {
        self.silence_form_adapter().update(cfg)
    }
}
