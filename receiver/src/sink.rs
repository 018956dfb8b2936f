use anyhow::{anyhow, Context, Result};
use log::debug;
use roadcap::PipelineOutput;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Appends one JSON line per processed reading to a daily file,
/// `readings_YYYYMMDD.jsonl`, dated by the reading's local timestamp.
pub struct JsonLinesSink {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create sink directory {}", dir.display()))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, output: &PipelineOutput) -> PathBuf {
        let day = output.reading.timestamp.format("%Y%m%d");
        self.dir.join(format!("readings_{day}.jsonl"))
    }

    pub fn append(&self, output: &PipelineOutput) -> Result<PathBuf> {
        let line = serde_json::to_string(output)?;
        let path = self.path_for(output);

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("sink lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        writeln!(file, "{line}")?;

        debug!("Appended reading for {} to {}", output.reading.segment_id, path.display());
        Ok(path)
    }
}
