use std::sync::Mutex;

/// The URL bar. Filters are mirrored into it with `push_state`; going back
/// in history is reported to the alert store as a popstate.
pub trait Location: Send + Sync {
    fn href(&self) -> String;

    fn push_state(&self, url: String);

    /// The `?...` part of `href`, empty when there is none.
    fn search(&self) -> String {
        let href = self.href();
        match href.find('?') {
            Some(idx) => href[idx..].to_string(),
            None => String::new(),
        }
    }

    /// `href` without its search part.
    fn base(&self) -> String {
        let href = self.href();
        match href.split_once('?') {
            Some((base, _)) => base.to_string(),
            None => href,
        }
    }
}

/// History kept in memory, used by the headless binary and in tests.
pub struct MemoryLocation {
    entries: Mutex<Vec<String>>,
}

impl MemoryLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(vec![href.into()]),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        match self.entries.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Step back one entry and return the new search, `None` at the start.
    pub fn back(&self) -> Option<String> {
        let mut entries = self.entries();
        if entries.len() < 2 {
            return None;
        }
        entries.pop();
        drop(entries);
        Some(self.search())
    }

    pub fn history_len(&self) -> usize {
        self.entries().len()
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> String {
        self.entries().last().cloned().unwrap_or_default()
    }

    fn push_state(&self, url: String) {
        self.entries().push(url);
    }
}
