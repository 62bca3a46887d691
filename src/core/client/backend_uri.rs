/// Formats URIs for client -> backend requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUri {
    base: String,
}

impl Default for BackendUri {
    fn default() -> Self {
        Self { base: ".".into() }
    }
}

impl BackendUri {
    /// An empty base falls back to `.` so paths stay relative.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            Self::default()
        } else {
            Self { base: base.into() }
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn format(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }
}
