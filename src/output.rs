//! Captured-output packaging helpers.
//!
//! Standalone helpers for storing or transporting captured text: raw deflate
//! compression and single-entry zip archives. Nothing here touches the
//! container pipeline.

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use std::io::{Cursor, Read, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Name of the single entry inside packed archives.
const ARCHIVE_ENTRY: &str = "data";

/// Packaging errors.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// Compression or decompression stream failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive could not be read or written
    #[error("zip archive error: {0}")]
    Zip(#[from] ZipError),

    /// Archive does not contain the expected entry
    #[error("zip archive has no `{0}` entry")]
    MissingEntry(&'static str),
}

/// Result type for packaging operations.
pub type Result<T> = std::result::Result<T, PackError>;

/// Compress text into a raw deflate stream (no header).
///
/// # Errors
///
/// Returns an error if the encoder fails to flush.
pub fn compress(text: &str) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

/// Decompress a raw deflate stream back into text.
///
/// # Errors
///
/// Returns an error if the stream is not valid deflate data or does not
/// decode to UTF-8.
pub fn decompress(bytes: &[u8]) -> Result<String> {
    let mut decoder = DeflateDecoder::new(bytes);
    let mut text = String::new();
    let _ = decoder.read_to_string(&mut text)?;
    Ok(text)
}

/// Pack text into a zip archive holding a single `data` entry.
///
/// # Errors
///
/// Returns an error if the archive cannot be written.
pub fn zip_pack(text: &str) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(ARCHIVE_ENTRY, SimpleFileOptions::default())?;
    writer.write_all(text.as_bytes())?;
    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Unpack text from a zip archive produced by [`zip_pack`].
///
/// # Errors
///
/// Returns [`PackError::MissingEntry`] if the archive has no `data` entry,
/// or an error if the bytes are not a readable zip archive.
pub fn zip_unpack(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entry = archive.by_name(ARCHIVE_ENTRY).map_err(|e| match e {
        ZipError::FileNotFound => PackError::MissingEntry(ARCHIVE_ENTRY),
        other => PackError::Zip(other),
    })?;

    let mut text = String::new();
    let _ = entry.read_to_string(&mut text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_round_trip() {
        let text = "ping output line 1\nline 2\n";
        let packed = compress(text).unwrap();
        assert_eq!(decompress(&packed).unwrap(), text);
    }

    #[test]
    fn deflate_round_trip_empty() {
        let packed = compress("").unwrap();
        assert_eq!(decompress(&packed).unwrap(), "");
    }

    #[test]
    fn deflate_shrinks_repetitive_text() {
        let text = "64 bytes from 10.0.0.1: seq=0 ttl=64\n".repeat(100);
        let packed = compress(&text).unwrap();
        assert!(packed.len() < text.len());
    }

    #[test]
    fn decompress_rejects_garbage() {
        assert!(decompress(b"definitely not deflate").is_err());
    }

    #[test]
    fn zip_round_trip() {
        let text = "PING 10.0.0.1 (10.0.0.1): 56 data bytes\n";
        let packed = zip_pack(text).unwrap();
        assert_eq!(zip_unpack(&packed).unwrap(), text);
    }

    #[test]
    fn zip_unpack_rejects_missing_entry() {
        // A valid archive whose only entry is not named `data`.
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"content").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = zip_unpack(&bytes).unwrap_err();
        assert!(matches!(err, PackError::MissingEntry("data")));
    }

    #[test]
    fn zip_unpack_rejects_non_archive_bytes() {
        assert!(zip_unpack(b"not a zip archive").is_err());
    }
}
