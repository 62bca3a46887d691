use anyhow::Result;

/// Storage for a single persisted record, one key of the local storage.
pub trait LocalStorageAdapterTrait<T>: Send + Sync {
    /// Read the record, falling back to its default when nothing usable is stored.
    fn read(&self) -> Result<T>;

    fn insert(&self, data: &T) -> Result<()>;

    fn update(&self, data: &T) -> Result<()>;

    fn delete(&self) -> Result<()>;
}
