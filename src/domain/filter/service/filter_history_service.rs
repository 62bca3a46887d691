use anyhow::Result;
use tracing::debug;

use crate::core::persistence::local::filters::filter_history_api_repository_trait::FilterHistoryApiRepository;
use crate::core::persistence::local::filters::filter_history_entity::FilterHistoryEntity;
use crate::core::persistence::local::filters::saved_filters_api_repository_trait::SavedFiltersApiRepository;
use crate::core::persistence::local::filters::saved_filters_entity::SavedFiltersEntity;
use crate::domain::filter::filter_codec::DecodedSearch;
use crate::domain::filter::filter_entity::Filter;

/// Remember the currently applied filter set. Returns whether history changed.
pub fn record_history<R>(repo: &R, filters: &[Filter]) -> Result<bool>
where
    R: FilterHistoryApiRepository + ?Sized,
{
    let set: Vec<_> = filters
        .iter()
        .filter(|f| f.is_history_candidate())
        .map(Filter::reduce)
        .collect();

    let mut history = repo.read()?;
    if !history.push(set) {
        return Ok(false);
    }
    repo.update(&history)?;
    debug!(entries = history.filters.len(), "Filter history updated");
    Ok(true)
}

pub fn read_history<R>(repo: &R) -> Result<FilterHistoryEntity>
where
    R: FilterHistoryApiRepository + ?Sized,
{
    repo.read()
}

pub fn clear_history<R>(repo: &R) -> Result<()>
where
    R: FilterHistoryApiRepository + ?Sized,
{
    repo.clear()
}

pub fn read_saved_filters<R>(repo: &R) -> Result<SavedFiltersEntity>
where
    R: SavedFiltersApiRepository + ?Sized,
{
    repo.read()
}

pub fn save_filters<R>(repo: &R, filters: &[Filter]) -> Result<SavedFiltersEntity>
where
    R: SavedFiltersApiRepository + ?Sized,
{
    let mut saved = repo.read()?;
    saved.save(filters.iter().map(Filter::reduce).collect());
    repo.update(&saved)?;
    Ok(saved)
}

pub fn clear_saved_filters<R>(repo: &R) -> Result<()>
where
    R: SavedFiltersApiRepository + ?Sized,
{
    let mut saved = repo.read()?;
    saved.clear();
    repo.update(&saved)
}

/// Filters to start with: the location wins when it names any, then the
/// user's saved set, then the defaults shipped with the page.
pub fn initial_filters(
    location: &DecodedSearch,
    saved: &SavedFiltersEntity,
    defaults: &[String],
) -> Vec<String> {
    if !location.defaults_used {
        return location.params.q.clone();
    }
    if saved.present {
        return saved.raws();
    }
    defaults.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persistence::local::local_storage_adapter_trait::LocalStorageAdapterTrait;
    use crate::domain::filter::filter_codec::decode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockHistoryAdapter {
        state: Mutex<FilterHistoryEntity>,
        writes: Mutex<usize>,
    }

    impl LocalStorageAdapterTrait<FilterHistoryEntity> for MockHistoryAdapter {
        fn read(&self) -> Result<FilterHistoryEntity> {
            Ok(self.state.lock().unwrap().clone())
        }

        fn insert(&self, data: &FilterHistoryEntity) -> Result<()> {
            *self.state.lock().unwrap() = data.clone();
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }

        fn update(&self, data: &FilterHistoryEntity) -> Result<()> {
            self.insert(data)
        }

        fn delete(&self) -> Result<()> {
            *self.state.lock().unwrap() = FilterHistoryEntity::default();
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockHistoryRepository {
        adapter: MockHistoryAdapter,
    }

    impl FilterHistoryApiRepository for MockHistoryRepository {
        fn fs_adapter(&self) -> &dyn LocalStorageAdapterTrait<FilterHistoryEntity> {
            &self.adapter
        }
    }

    fn applied(raw: &str, value: &str) -> Filter {
        Filter {
            applied: true,
            value: value.into(),
            ..Filter::new_unapplied(raw)
        }
    }

    #[test]
    fn only_applied_valid_filters_with_value_are_recorded() {
        let repo = MockHistoryRepository::default();
        let filters = vec![
            applied("cluster=prod", "prod"),
            Filter::new_unapplied("pending"),
            Filter {
                is_valid: false,
                ..applied("bad", "x")
            },
            applied("fuzzy", ""),
        ];

        assert!(record_history(&repo, &filters).unwrap());

        let stored = repo.adapter.state.lock().unwrap().clone();
        assert_eq!(stored.filters.len(), 1);
        assert_eq!(stored.filters[0].len(), 1);
        assert_eq!(stored.filters[0][0].raw, "cluster=prod");
    }

    #[test]
    fn unchanged_history_is_not_rewritten() {
        let repo = MockHistoryRepository::default();
        let filters = vec![applied("a=1", "1")];
        assert!(record_history(&repo, &filters).unwrap());
        assert!(!record_history(&repo, &filters).unwrap());
        assert!(!record_history(&repo, &[]).unwrap());
        assert_eq!(*repo.adapter.writes.lock().unwrap(), 1);
    }

    #[test]
    fn initial_filters_precedence() {
        let defaults = vec!["@state=active".to_string()];
        let mut saved = SavedFiltersEntity::default();

        assert_eq!(initial_filters(&decode("?q=foo"), &saved, &defaults), vec!["foo"]);
        assert!(initial_filters(&decode("?q="), &saved, &defaults).is_empty());
        assert_eq!(initial_filters(&decode(""), &saved, &defaults), defaults);

        saved.save(vec![applied("mine", "x").reduce()]);
        assert_eq!(initial_filters(&decode(""), &saved, &defaults), vec!["mine"]);
    }
}
