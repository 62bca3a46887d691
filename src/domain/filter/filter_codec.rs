use crate::domain::filter::location::Location;

/// Query parameters understood by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// Filters, in order.
    pub q: Vec<String>,
    /// Every other parameter, first-seen order, last value wins.
    pub extra: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedSearch {
    pub params: QueryParams,
    /// No `q` key at all, as opposed to `q=` (explicitly no filters).
    pub defaults_used: bool,
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(v) => v.into_owned(),
        Err(_) => spaced,
    }
}

fn is_filter_key(key: &str) -> bool {
    if key == "q" || key == "q[]" {
        return true;
    }
    key.strip_prefix("q[")
        .and_then(|rest| rest.strip_suffix(']'))
        .map(|idx| idx.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// Decode a location search string (`?q=a&q=b`, leading `?` optional).
///
/// Repeated filters keep their first position, empty ones are dropped.
pub fn decode(search: &str) -> DecodedSearch {
    let query = search.strip_prefix('?').unwrap_or(search);

    let mut raw_q: Vec<String> = Vec::new();
    let mut saw_q = false;
    let mut extra: Vec<(String, String)> = Vec::new();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(k);
        let value = decode_component(v);

        if is_filter_key(&key) {
            saw_q = true;
            raw_q.push(value);
        } else if let Some(slot) = extra.iter_mut().find(|(ek, _)| *ek == key) {
            slot.1 = value;
        } else {
            extra.push((key, value));
        }
    }

    let mut q: Vec<String> = Vec::with_capacity(raw_q.len());
    for v in raw_q {
        if !q.contains(&v) {
            q.push(v);
        }
    }
    q.retain(|v| !v.is_empty());

    DecodedSearch {
        params: QueryParams { q, extra },
        defaults_used: !saw_q,
    }
}

/// `q=a&q=b`, no indices and no leading `?`.
pub fn encode(q: &[String]) -> String {
    q.iter()
        .map(|v| format!("q={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Query for a new filter list that keeps every non-filter parameter of
/// `current_search`. Filters come first.
pub fn format_api_filter_query(current_search: &str, q: &[String]) -> String {
    let decoded = decode(current_search);
    let mut parts: Vec<String> = Vec::new();
    let filters = encode(q);
    if !filters.is_empty() {
        parts.push(filters);
    }
    for (k, v) in &decoded.params.extra {
        parts.push(format!("{}={}", k, urlencoding::encode(v)));
    }
    parts.join("&")
}

/// Push the filter list into the location history. An empty query is
/// written as `q=` so that reloading keeps "no filters" instead of defaults.
pub fn update_location_search(location: &dyn Location, q: &[String]) {
    let query = format_api_filter_query(&location.search(), q);
    let query = if query.is_empty() { "q=".to_string() } else { query };
    location.push_state(format!("{}?{}", location.base(), query));
}
