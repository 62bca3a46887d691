use crate::core::persistence::local::settings::ui_settings_entity::{
    GridConfigEntity, MultiGridConfigEntity, SortOrder,
};
use crate::domain::alert::alert_store::FetchParams;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSettings {
    pub use_defaults: bool,
    pub sort_order: String,
    pub sort_label: String,
    pub sort_reverse: String,
}

/// Sort arguments for the alerts request. `default` leaves everything to the
/// backend, `disabled` only sends the order.
pub fn get_sort_settings(grid: &GridConfigEntity) -> SortSettings {
    if grid.sort_order == SortOrder::Default {
        return SortSettings {
            use_defaults: true,
            ..Default::default()
        };
    }

    let mut settings = SortSettings {
        sort_order: grid.sort_order.as_str().to_string(),
        ..Default::default()
    };
    if grid.sort_order == SortOrder::Disabled {
        return settings;
    }

    settings.sort_reverse = match grid.reverse_sort {
        Some(true) => "1".into(),
        Some(false) => "0".into(),
        None => String::new(),
    };
    if let Some(label) = &grid.sort_label {
        settings.sort_label = label.clone();
    }
    settings
}

pub fn fetch_params(grid: &GridConfigEntity, multi_grid: &MultiGridConfigEntity) -> FetchParams {
    let sort = get_sort_settings(grid);
    FetchParams {
        grid_label: multi_grid.grid_label.clone(),
        grid_sort_reverse: multi_grid.grid_sort_reverse,
        sort_order: sort.sort_order,
        sort_label: sort.sort_label,
        sort_reverse: sort.sort_reverse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(order: SortOrder, label: Option<&str>, reverse: Option<bool>) -> GridConfigEntity {
        GridConfigEntity {
            sort_order: order,
            sort_label: label.map(String::from),
            reverse_sort: reverse,
        }
    }

    #[test]
    fn default_order_sends_nothing() {
        let s = get_sort_settings(&grid(SortOrder::Default, Some("job"), Some(true)));
        assert!(s.use_defaults);
        assert_eq!(s.sort_order, "");
        assert_eq!(s.sort_reverse, "");
    }

    #[test]
    fn disabled_order_sends_only_the_order() {
        let s = get_sort_settings(&grid(SortOrder::Disabled, Some("job"), Some(true)));
        assert_eq!(s.sort_order, "disabled");
        assert_eq!(s.sort_label, "");
        assert_eq!(s.sort_reverse, "");
    }

    #[test]
    fn label_order_carries_label_and_direction() {
        let s = get_sort_settings(&grid(SortOrder::Label, Some("severity"), Some(false)));
        assert_eq!(s.sort_order, "label");
        assert_eq!(s.sort_label, "severity");
        assert_eq!(s.sort_reverse, "0");

        let s = get_sort_settings(&grid(SortOrder::StartsAt, None, None));
        assert_eq!(s.sort_reverse, "");
    }

    #[test]
    fn params_include_multi_grid() {
        let mg = MultiGridConfigEntity {
            grid_label: "cluster".into(),
            grid_sort_reverse: true,
        };
        let p = fetch_params(&grid(SortOrder::StartsAt, None, Some(true)), &mg);
        assert_eq!(p.grid_label, "cluster");
        assert!(p.grid_sort_reverse);
        assert_eq!(p.sort_order, "startsAt");
        assert_eq!(p.sort_reverse, "1");
    }
}
