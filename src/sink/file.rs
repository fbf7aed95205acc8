use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Sink;
use crate::config::FileConfig;
use crate::error::{TrackError, TrackResult};

/// Append-only NDJSON file, one message per line.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> TrackResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "file sink opened");
        Ok(Self { path, file: Some(file) })
    }

    pub fn from_config(config: &FileConfig) -> TrackResult<Self> {
        Self::open(&config.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

impl Sink for FileSink {
    fn send(&mut self, message: String) -> TrackResult<()> {
        let file = self.file.as_mut().ok_or(TrackError::SinkClosed)?;
        let mut line = message;
        line.push('\n');
        // single write per line keeps appends from interleaving
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> TrackResult<()> {
        match self.file.as_mut() {
            Some(file) => Ok(file.flush()?),
            None => Err(TrackError::SinkClosed),
        }
    }

    fn close(&mut self) -> TrackResult<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            debug!(path = %self.path.display(), "file sink closed");
        }
        Ok(())
    }
}
