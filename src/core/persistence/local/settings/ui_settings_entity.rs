use serde::{Deserialize, Serialize};

/// Poll interval override, seconds. `None` until the user picks one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfigEntity {
    #[serde(default)]
    pub interval: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    /// Use the defaults exported by the backend.
    #[default]
    Default,
    Disabled,
    StartsAt,
    Label,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Default => "default",
            SortOrder::Disabled => "disabled",
            SortOrder::StartsAt => "startsAt",
            SortOrder::Label => "label",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfigEntity {
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub sort_label: Option<String>,
    #[serde(default)]
    pub reverse_sort: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiGridConfigEntity {
    #[serde(default)]
    pub grid_label: String,
    #[serde(default)]
    pub grid_sort_reverse: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilenceFormConfigEntity {
    #[serde(default)]
    pub author: String,
}
