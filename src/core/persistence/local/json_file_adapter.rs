use std::{
    fs::{self, File},
    io::Write,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use super::local_storage_adapter_trait::LocalStorageAdapterTrait;

/// JSON file backed storage key.
///
/// A missing file reads as `T::default()`. So does a corrupt one, after a
/// warning, so a broken file never blocks startup. Writes go through a temp
/// file and a rename.
pub struct JsonFileAdapter<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileAdapter<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> LocalStorageAdapterTrait<T> for JsonFileAdapter<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn read(&self) -> Result<T> {
        if !self.path.exists() {
            return Ok(T::default());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        match serde_json::from_str(&raw) {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt storage file");
                Ok(T::default())
            }
        }
    }

    fn insert(&self, data: &T) -> Result<()> {
        self.write(data)
    }

    fn update(&self, data: &T) -> Result<()> {
        self.write(data)
    }

    fn delete(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to delete {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl<T: Serialize> JsonFileAdapter<T> {
    fn write(&self, data: &T) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Failed to create storage directory")?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp_path).context("Failed to create temp storage file")?;
        let body = serde_json::to_string_pretty(data).context("Failed to serialize record")?;
        f.write_all(body.as_bytes())?;
        f.flush()?;
        f.sync_all().context("Failed to sync temp storage file")?;

        fs::rename(&tmp_path, &self.path).context("Failed to finalize storage file")?;
        Ok(())
    }
}
