use std::path::PathBuf;

use tokio::fs;

use crate::core::{CacheStore, CachedState};
use crate::meter::MeterIdentity;

/// Cache store writing one JSON file per meter into a directory, named after
/// the meter key. Survives restarts; a missing file reads as "never saved".
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, meter: &MeterIdentity) -> PathBuf {
        self.dir.join(format!("{}.json", meter.key()))
    }
}

impl CacheStore for JsonFileCache {
    async fn load(&self, meter: &MeterIdentity) -> anyhow::Result<Option<CachedState>> {
        match fs::read(self.file_for(meter)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, meter: &MeterIdentity, state: &CachedState) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.file_for(meter), serde_json::to_vec_pretty(state)?).await?;
        Ok(())
    }
}
