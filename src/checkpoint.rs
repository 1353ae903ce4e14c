//! Persisted collection progress.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{error::CheckpointError, types::TradeRecord};

/// Storage of the accumulated dataset between runs.
///
/// `save` overwrites the previous snapshot as a whole.
pub trait CheckpointStore {
    /// Last saved snapshot, `None` if nothing was saved.
    fn load(&self) -> Result<Option<Vec<TradeRecord>>, CheckpointError>;

    fn save(&self, records: &[TradeRecord]) -> Result<(), CheckpointError>;

    /// Remove the snapshot after a completed run.
    fn clear(&self) -> Result<(), CheckpointError>;
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for &T {
    fn load(&self) -> Result<Option<Vec<TradeRecord>>, CheckpointError> {
        (**self).load()
    }

    fn save(&self, records: &[TradeRecord]) -> Result<(), CheckpointError> {
        (**self).save(records)
    }

    fn clear(&self) -> Result<(), CheckpointError> {
        (**self).clear()
    }
}

/// Checkpoint kept as a CSV file with [`TradeRecord`] columns.
#[derive(Clone, Debug)]
pub struct CsvCheckpoint {
    path: PathBuf,
}

impl CsvCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for CsvCheckpoint {
    fn load(&self) -> Result<Option<Vec<TradeRecord>>, CheckpointError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<TradeRecord>, _>>()?;
        debug!(path = %self.path.display(), len = records.len(), "Loaded checkpoint");
        Ok(Some(records))
    }

    fn save(&self, records: &[TradeRecord]) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Write aside and rename so an interrupted save keeps the previous snapshot
        let temp = self.temp_path();
        let mut writer = csv::Writer::from_path(&temp)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        drop(writer);
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CheckpointError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
