//! HEIC/HEIF pre-conversion boundary.
//!
//! The `image` crate has no HEIF decoder, so HEIC uploads are handed to an
//! external converter that turns them into JPEG before the normal decode
//! path. A failed conversion drops the file from the load.

use crate::assets::RawFile;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeicError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HEIC conversion is not available")]
    Unavailable,
    #[error("{program} failed on {name}: {stderr}")]
    ConverterFailed {
        program: String,
        name: String,
        stderr: String,
    },
}

/// Converts one HEIC/HEIF file into a JPEG raw file.
pub trait HeicConverter: Sync {
    fn convert(&self, file: &RawFile) -> Result<RawFile, HeicError>;
}

/// `true` when the file must go through the converter before decoding.
pub fn is_heic(file: &RawFile) -> bool {
    let mime = file.mime_type.to_ascii_lowercase();
    mime == "image/heic" || mime == "image/heif" || has_heic_extension(&file.name)
}

fn has_heic_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ext.eq_ignore_ascii_case("heic") || ext.eq_ignore_ascii_case("heif")
    })
}

/// `photo.HEIC` → `photo.jpg`; other names are returned unchanged.
pub fn converted_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if has_heic_extension(name) => format!("{stem}.jpg"),
        _ => name.to_string(),
    }
}

/// Build the converted raw file, keeping the original timestamp.
fn converted_file(original: &RawFile, jpeg: Vec<u8>) -> RawFile {
    RawFile {
        name: converted_name(&original.name),
        mime_type: "image/jpeg".to_string(),
        bytes: jpeg,
        last_modified: original.last_modified,
    }
}

/// Shells out to a command-line converter (`heif-convert in out`).
///
/// The program receives the input path followed by the output path and
/// must write a JPEG to the output path.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl HeicConverter for CommandConverter {
    fn convert(&self, file: &RawFile) -> Result<RawFile, HeicError> {
        let dir = tempfile::TempDir::new()?;
        let input: PathBuf = dir.path().join("input.heic");
        let output: PathBuf = dir.path().join("output.jpg");
        std::fs::write(&input, &file.bytes)?;

        let result = Command::new(&self.program)
            .arg(&input)
            .arg(&output)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => HeicError::Unavailable,
                _ => HeicError::Io(e),
            })?;
        if !result.status.success() {
            return Err(HeicError::ConverterFailed {
                program: self.program.clone(),
                name: file.name.clone(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let jpeg = std::fs::read(&output)?;
        Ok(converted_file(file, jpeg))
    }
}

/// Converter used when no HEIC support is configured: every HEIC file is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeicSupport;

impl HeicConverter for NoHeicSupport {
    fn convert(&self, _file: &RawFile) -> Result<RawFile, HeicError> {
        Err(HeicError::Unavailable)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Converter that "converts" by passing the payload through untouched.
    pub struct PassthroughConverter;

    impl HeicConverter for PassthroughConverter {
        fn convert(&self, file: &RawFile) -> Result<RawFile, HeicError> {
            Ok(converted_file(file, file.bytes.clone()))
        }
    }

    #[test]
    fn detects_heic_by_mime() {
        let file = RawFile::new("IMG_0001", "image/heif", vec![]);
        assert!(is_heic(&file));
    }

    #[test]
    fn detects_heic_by_extension_case_insensitive() {
        assert!(is_heic(&RawFile::new("IMG_0001.HEIC", "", vec![])));
        assert!(is_heic(&RawFile::new("a.heif", "application/octet-stream", vec![])));
        assert!(!is_heic(&RawFile::new("a.jpg", "image/jpeg", vec![])));
        assert!(!is_heic(&RawFile::new("heic", "image/png", vec![])));
    }

    #[test]
    fn converted_name_swaps_extension() {
        assert_eq!(converted_name("IMG_0001.HEIC"), "IMG_0001.jpg");
        assert_eq!(converted_name("trip.photo.heif"), "trip.photo.jpg");
        assert_eq!(converted_name("plain.png"), "plain.png");
    }

    #[test]
    fn converted_file_keeps_timestamp() {
        let mut original = RawFile::new("a.heic", "image/heic", vec![1, 2]);
        original.last_modified = 1_700_000_000_000;
        let converted = converted_file(&original, vec![0xFF, 0xD8]);
        assert_eq!(converted.name, "a.jpg");
        assert_eq!(converted.mime_type, "image/jpeg");
        assert_eq!(converted.last_modified, 1_700_000_000_000);
    }

    #[test]
    fn no_support_always_fails() {
        let file = RawFile::new("a.heic", "image/heic", vec![]);
        assert!(matches!(
            NoHeicSupport.convert(&file),
            Err(HeicError::Unavailable)
        ));
    }

    #[test]
    fn missing_program_is_unavailable() {
        let converter = CommandConverter::new("definitely-not-a-heic-converter-binary");
        let file = RawFile::new("a.heic", "image/heic", vec![0; 8]);
        assert!(matches!(
            converter.convert(&file),
            Err(HeicError::Unavailable)
        ));
    }
}
