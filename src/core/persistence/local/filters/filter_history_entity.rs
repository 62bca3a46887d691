use serde::{Deserialize, Serialize};

/// The subset of a filter worth remembering: enough to render it again
/// with its name and value, without hit counts or validity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReducedFilterEntity {
    pub raw: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub matcher: String,
    #[serde(default)]
    pub value: String,
}

/// Recently applied filter sets, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterHistoryEntity {
    #[serde(default)]
    pub filters: Vec<Vec<ReducedFilterEntity>>,
}

impl FilterHistoryEntity {
    pub const MAX_ENTRIES: usize = 8;

    /// Put `set` on top. An equal set already stored moves up instead of
    /// being duplicated. Empty sets are ignored. Returns whether anything
    /// changed.
    pub fn push(&mut self, set: Vec<ReducedFilterEntity>) -> bool {
        if set.is_empty() {
            return false;
        }
        if self.filters.first() == Some(&set) {
            return false;
        }

        let mut next = Vec::with_capacity(Self::MAX_ENTRIES);
        next.push(set.clone());
        next.extend(self.filters.drain(..).filter(|f| *f != set));
        next.truncate(Self::MAX_ENTRIES);
        self.filters = next;
        true
    }
}
