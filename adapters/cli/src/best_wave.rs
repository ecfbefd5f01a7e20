//! JSON file persistence of the best wave reached.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shape_defence_engine::progression::BestWaveStore;

/// Contents of the best-wave file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct BestWaveRecord {
    best_wave: u32,
}

/// Stores the best wave as a small JSON document on disk.
#[derive(Clone, Debug)]
pub(crate) struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BestWaveStore for JsonFileStore {
    type Error = anyhow::Error;

    fn load_best_wave(&mut self) -> Result<Option<u32>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("failed to read best wave from {}", self.path.display())
                })
            }
        };

        let record: BestWaveRecord = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse best wave in {}", self.path.display()))?;
        Ok(Some(record.best_wave))
    }

    fn save_best_wave(&mut self, wave: u32) -> Result<()> {
        let json = serde_json::to_string_pretty(&BestWaveRecord { best_wave: wave })
            .context("failed to serialize best wave")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write best wave to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_defence_engine::progression::{record_session, BestWave};

    fn scratch_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "shape-defence-{}-{name}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn missing_file_has_no_record() {
        let mut store = JsonFileStore::new(scratch_file("missing"));
        assert_eq!(store.load_best_wave().expect("load"), None);
    }

    #[test]
    fn record_round_trips_through_disk() {
        let path = scratch_file("record");
        let mut store = JsonFileStore::new(&path);

        let best = record_session(&mut store, 6).expect("record");
        assert_eq!(
            best,
            BestWave {
                wave: 6,
                new_record: true
            }
        );

        let mut reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load_best_wave().expect("load"), Some(6));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let path = scratch_file("corrupt");
        fs::write(&path, "not json").expect("write scratch file");

        let mut store = JsonFileStore::new(&path);
        assert!(store.load_best_wave().is_err());
        let _ = fs::remove_file(path);
    }
}
