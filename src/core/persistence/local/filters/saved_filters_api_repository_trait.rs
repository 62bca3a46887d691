use crate::core::persistence::local::local_storage_adapter_trait::LocalStorageAdapterTrait;

use super::saved_filters_entity::SavedFiltersEntity;

pub trait SavedFiltersApiRepository: Send + Sync {
    fn fs_adapter(&self) -> &dyn LocalStorageAdapterTrait<SavedFiltersEntity>;

    fn read(&self) -> anyhow::Result<SavedFiltersEntity> {
        self.fs_adapter().read()
    }

    fn update(&self, saved: &SavedFiltersEntity) -> anyhow::Result<()> {
        self.fs_adapter().update(saved)
    }
}
