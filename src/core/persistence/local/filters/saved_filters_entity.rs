use serde::{Deserialize, Serialize};

use super::filter_history_entity::ReducedFilterEntity;

/// Filters the user pinned as their personal default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFiltersEntity {
    #[serde(default)]
    pub filters: Vec<ReducedFilterEntity>,
    #[serde(default)]
    pub present: bool,
}

impl SavedFiltersEntity {
    pub fn save(&mut self, filters: Vec<ReducedFilterEntity>) {
        self.filters = filters;
        self.present = true;
    }

    pub fn clear(&mut self) {
        self.filters.clear();
        self.present = false;
    }

    pub fn raws(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.raw.clone()).collect()
    }
}
