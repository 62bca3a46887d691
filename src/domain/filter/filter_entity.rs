use serde::{Deserialize, Serialize};

use crate::core::persistence::local::filters::filter_history_entity::ReducedFilterEntity;

/// A single filter predicate as held by the alert store.
///
/// `raw` is canonical and unique within a list. The parsed parts and the hit
/// count only become meaningful once a response has applied the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub raw: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub matcher: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub applied: bool,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub hits: u64,
}

impl Filter {
    pub fn new_unapplied(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            name: String::new(),
            matcher: String::new(),
            value: String::new(),
            applied: false,
            is_valid: true,
            hits: 0,
        }
    }

    pub fn reduce(&self) -> ReducedFilterEntity {
        ReducedFilterEntity {
            raw: self.raw.clone(),
            name: self.name.clone(),
            matcher: self.matcher.clone(),
            value: self.value.clone(),
        }
    }

    /// Worth keeping in history: applied, valid and carrying a value.
    pub fn is_history_candidate(&self) -> bool {
        self.applied && self.is_valid && !self.value.is_empty()
    }
}

/// Sorted, de-duplicated `raw` values, used to compare filter sets.
pub fn raw_set<'a, I>(raws: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = raws.into_iter().map(String::from).collect();
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_filters_start_unapplied_and_valid() {
        let f = Filter::new_unapplied("foo=bar");
        assert!(!f.applied);
        assert!(f.is_valid);
        assert_eq!(f.hits, 0);
        assert!(f.name.is_empty() && f.matcher.is_empty() && f.value.is_empty());
        assert!(!f.is_history_candidate());
    }

    #[test]
    fn raw_set_ignores_order_and_duplicates() {
        assert_eq!(raw_set(["b", "a", "b"]), raw_set(["a", "b"]));
    }
}
