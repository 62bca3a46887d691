use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// A reactive state cell.
///
/// Readers get a cheap `Arc` snapshot. Every mutation goes through `set` or
/// `update`, which bump the version and wake all subscribers, so derived
/// values and background tasks always observe whole states, never partial ones.
pub struct Observable<T> {
    tx: watch::Sender<Arc<T>>,
    version: AtomicU64,
}

impl<T> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(value));
        Self {
            tx,
            version: AtomicU64::new(0),
        }
    }

    /// Return the current snapshot (zero copy).
    pub fn get(&self) -> Arc<T> {
        self.tx.borrow().clone()
    }

    /// Monotonic mutation counter, used to invalidate memoised derivations.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Replace the entire value.
    pub fn set(&self, value: T) {
        self.tx.send_modify(|current| {
            *current = Arc::new(value);
            self.version.fetch_add(1, Ordering::AcqRel);
        });
    }

    /// Mutate by cloning the current value, applying `f` and swapping it in.
    pub fn update<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut out = None;
        self.tx.send_modify(|current| {
            let mut next = (**current).clone();
            out = Some(f(&mut next));
            *current = Arc::new(next);
            self.version.fetch_add(1, Ordering::AcqRel);
        });
        match out {
            Some(r) => r,
            None => unreachable!("send_modify always runs its closure"),
        }
    }

    /// Like `update`, but subscribers are only woken when `f` returns `true`.
    pub fn update_if<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        self.tx.send_if_modified(|current| {
            let mut next = (**current).clone();
            if f(&mut next) {
                *current = Arc::new(next);
                self.version.fetch_add(1, Ordering::AcqRel);
                true
            } else {
                false
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

impl<T> Default for Observable<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}
