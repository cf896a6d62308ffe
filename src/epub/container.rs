//! ZIP container wrapper for EPUB archives.

use super::package;
use crate::error::{Error, Result};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// EPUB container paths.
mod paths {
    pub const MIMETYPE: &str = "mimetype";
    pub const CONTAINER_XML: &str = "META-INF/container.xml";
}

/// Media type stored in the `mimetype` entry.
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// One archive entry, fully loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub data: Vec<u8>,
    pub is_dir: bool,
}

/// In-memory ZIP container for EPUB files.
///
/// Entries keep the order they had in the source archive.
#[derive(Debug, Clone, Default)]
pub struct EpubContainer {
    entries: Vec<Entry>,
}

impl EpubContainer {
    /// Opens an EPUB container from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Opens an EPUB container from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Opens an EPUB container from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let is_dir = file.is_dir();
            let mut data = Vec::new();
            if !is_dir {
                file.read_to_end(&mut data)?;
            }
            entries.push(Entry { name, data, is_dir });
        }

        Ok(Self { entries })
    }

    /// Creates a container from already-loaded entries.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Checks the `mimetype` entry names an EPUB.
    pub fn verify_mimetype(&self) -> bool {
        match self.read_binary(paths::MIMETYPE) {
            Ok(data) => String::from_utf8_lossy(data).trim() == EPUB_MIMETYPE,
            // Some producers omit the mimetype entry
            Err(_) => true,
        }
    }

    /// All entries in archive order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks if a file exists in the archive.
    pub fn file_exists(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Reads a file from the archive as UTF-8 string.
    pub fn read_file(&self, path: &str) -> Result<String> {
        let data = self.read_binary(path)?;
        Ok(std::str::from_utf8(data)?.to_string())
    }

    /// Reads a binary file from the archive.
    pub fn read_binary(&self, path: &str) -> Result<&[u8]> {
        self.find(path)
            .map(|entry| entry.data.as_slice())
            .ok_or_else(|| Error::MissingComponent(path.to_string()))
    }

    /// Replaces the contents of an existing file, keeping its position.
    pub fn replace(&mut self, path: &str, data: Vec<u8>) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| !e.is_dir && e.name == path)
            .ok_or_else(|| Error::MissingComponent(path.to_string()))?;
        entry.data = data;
        Ok(())
    }

    /// Reads `META-INF/container.xml` and returns the package document path.
    pub fn rootfile_path(&self) -> Result<String> {
        let container_xml = self.read_file(paths::CONTAINER_XML)?;
        package::parse_rootfile(&container_xml)
    }

    /// Serializes the container into a new ZIP archive.
    ///
    /// `mimetype` is written first and stored uncompressed, as OCF requires;
    /// everything else follows in the original order, deflated.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mimetype = self
            .read_binary(paths::MIMETYPE)
            .unwrap_or(EPUB_MIMETYPE.as_bytes());
        zip.start_file(paths::MIMETYPE, stored)?;
        zip.write_all(mimetype)?;

        for entry in &self.entries {
            if entry.name == paths::MIMETYPE {
                continue;
            }
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), deflated)?;
            } else {
                zip.start_file(entry.name.as_str(), deflated)?;
                zip.write_all(&entry.data)?;
            }
        }

        Ok(zip.finish()?)
    }

    /// Serializes the container into a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let cursor = self.write_to(Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }

    fn find(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| !e.is_dir && e.name == path)
    }
}
