//! Where produced payloads go.
//!
//! Export code never writes files or touches the clipboard itself. It hands
//! finished payloads to a [`Downloader`] and trace text to a
//! [`ClipboardWriter`], so tests can swap in [`MemoryDownloader`] and
//! [`RecordingClipboard`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("IO error writing {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Refusing to write '{0}': not a plain file name")]
    InvalidName(String),
}

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("Clipboard write failed: {0}")]
    Write(String),
}

/// Delivers one named payload to the user.
pub trait Downloader: Sync {
    fn download(&self, name: &str, mime_type: &str, bytes: &[u8]) -> Result<(), DownloadError>;
}

/// Writes plain text to the clipboard.
pub trait ClipboardWriter: Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Writes every download into one directory.
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Downloader for DirectoryDownloader {
    fn download(&self, name: &str, _mime_type: &str, bytes: &[u8]) -> Result<(), DownloadError> {
        let plain = Path::new(name)
            .file_name()
            .is_some_and(|n| n == name && name != "." && name != "..");
        if !plain {
            return Err(DownloadError::InvalidName(name.to_string()));
        }
        let io_err = |source| DownloadError::Io {
            name: name.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(self.dir.join(name), bytes).map_err(io_err)?;
        tracing::info!(file = %self.dir.join(name).display(), bytes = bytes.len(), "wrote");
        Ok(())
    }
}

/// One captured download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Keeps downloads in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemoryDownloader {
    downloads: Mutex<Vec<Download>>,
}

impl MemoryDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downloads(&self) -> Vec<Download> {
        self.downloads
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.downloads().into_iter().map(|d| d.name).collect()
    }
}

impl Downloader for MemoryDownloader {
    fn download(&self, name: &str, mime_type: &str, bytes: &[u8]) -> Result<(), DownloadError> {
        if let Ok(mut downloads) = self.downloads.lock() {
            downloads.push(Download {
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                bytes: bytes.to_vec(),
            });
        }
        Ok(())
    }
}

/// The desktop clipboard, through `arboard`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardWriter for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// Captures clipboard writes; can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingClipboard {
    fail: bool,
    writes: Mutex<Vec<String>>,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl ClipboardWriter for RecordingClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Write("permission denied".to_string()));
        }
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(text.to_string());
        }
        Ok(())
    }
}
