use crate::core::persistence::local::local_storage_adapter_trait::LocalStorageAdapterTrait;

use super::filter_history_entity::FilterHistoryEntity;

pub trait FilterHistoryApiRepository: Send + Sync {
    fn fs_adapter(&self) -> &dyn LocalStorageAdapterTrait<FilterHistoryEntity>;

    fn read(&self) -> anyhow::Result<FilterHistoryEntity> {
        self.fs_adapter().read()
    }

    fn update(&self, history: &FilterHistoryEntity) -> anyhow::Result<()> {
        self.fs_adapter().update(history)
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.fs_adapter().delete()
    }
}
