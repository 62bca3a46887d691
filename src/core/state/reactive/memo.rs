use std::sync::{Arc, Mutex};

/// Memoised derived value keyed by the version of the cell it derives from.
///
/// The value is computed lazily on first read and reused until the source
/// version moves.
pub struct Memo<T> {
    slot: Mutex<Option<(u64, Arc<T>)>>,
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_compute<F>(&self, version: u64, compute: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        let mut guard = match self.slot.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some((cached_version, value)) = guard.as_ref() {
            if *cached_version == version {
                return value.clone();
            }
        }
        let value = Arc::new(compute());
        *guard = Some((version, value.clone()));
        value
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn recomputes_only_on_version_change() {
        let memo = Memo::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            calls.get() * 10
        };

        assert_eq!(*memo.get_or_compute(1, compute), 10);
        assert_eq!(*memo.get_or_compute(1, || unreachable!()), 10);
        assert_eq!(*memo.get_or_compute(2, compute), 20);
        assert_eq!(calls.get(), 2);
    }
}
