use std::path::Path;

use crate::core::persistence::local::json_file_adapter::JsonFileAdapter;
use crate::core::persistence::local::local_storage_adapter_trait::LocalStorageAdapterTrait;
use crate::core::persistence::storage_path::{filter_history_path, saved_filters_path};

use super::filter_history_api_repository_trait::FilterHistoryApiRepository;
use super::filter_history_entity::FilterHistoryEntity;
use super::saved_filters_api_repository_trait::SavedFiltersApiRepository;
use super::saved_filters_entity::SavedFiltersEntity;

pub struct FilterHistoryRepository {
    adapter: JsonFileAdapter<FilterHistoryEntity>,
}

impl FilterHistoryRepository {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            adapter: JsonFileAdapter::new(filter_history_path(data_dir)),
        }
    }
}

impl FilterHistoryApiRepository for FilterHistoryRepository {
    fn fs_adapter(&self) -> &dyn LocalStorageAdapterTrait<FilterHistoryEntity> {
        &self.adapter
    }
}

pub struct SavedFiltersRepository {
    adapter: JsonFileAdapter<SavedFiltersEntity>,
}

impl SavedFiltersRepository {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            adapter: JsonFileAdapter::new(saved_filters_path(data_dir)),
        }
    }
}

impl SavedFiltersApiRepository for SavedFiltersRepository {
    fn fs_adapter(&self) -> &dyn LocalStorageAdapterTrait<SavedFiltersEntity> {
        &self.adapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persistence::local::filters::filter_history_entity::ReducedFilterEntity;

    #[test]
    fn history_survives_a_new_repository_instance() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = FilterHistoryEntity::default();
        history.push(vec![ReducedFilterEntity {
            raw: "cluster=prod".into(),
            name: "cluster".into(),
            matcher: "=".into(),
            value: "prod".into(),
        }]);
        FilterHistoryRepository::new(dir.path()).update(&history).unwrap();

        let reread = FilterHistoryRepository::new(dir.path()).read().unwrap();
        assert_eq!(reread, history);
        assert!(dir.path().join("filters.json").exists());
    }

    #[test]
    fn saved_filters_default_to_absent() {
        let dir = tempfile::tempdir().unwrap();
        let saved = SavedFiltersRepository::new(dir.path()).read().unwrap();
        assert!(!saved.present);
        assert!(saved.filters.is_empty());
    }
}
