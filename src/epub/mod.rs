//! EPUB archive reading and writing.
//!
//! An EPUB is a ZIP archive whose `META-INF/container.xml` points to an OPF
//! package document. The package lists every item (manifest) and the order
//! a reader presents them in (spine).

mod container;
mod package;

pub use container::{Entry, EpubContainer, EPUB_MIMETYPE};
pub use package::{
    parse_package, parse_rootfile, resolve_href, rewrite_spine, ManifestItem, Package,
};

use crate::error::Result;
use log::{debug, warn};
use std::io::{Read, Seek};
use std::path::Path;

/// An EPUB loaded into memory.
#[derive(Debug, Clone)]
pub struct Epub {
    container: EpubContainer,
    opf_path: String,
    package: Package,
}

impl Epub {
    /// Opens an EPUB from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let container = EpubContainer::open(path)?;
        Self::from_container(container)
    }

    /// Opens an EPUB from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let container = EpubContainer::from_reader(reader)?;
        Self::from_container(container)
    }

    /// Opens an EPUB from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = EpubContainer::from_bytes(data)?;
        Self::from_container(container)
    }

    /// Reads the package document of an opened container.
    pub fn from_container(container: EpubContainer) -> Result<Self> {
        if !container.verify_mimetype() {
            warn!("mimetype entry does not declare {}", EPUB_MIMETYPE);
        }

        let opf_path = container.rootfile_path()?;
        let opf = container.read_file(&opf_path)?;
        let mut package = parse_package(&opf, &opf_path)?;

        // Hrefs are URLs; archive names are not percent-encoded
        for item in &mut package.manifest {
            if !container.file_exists(&item.path) {
                if let Ok(decoded) = urlencoding::decode(&item.path) {
                    if container.file_exists(&decoded) {
                        item.path = decoded.into_owned();
                    }
                }
            }
        }

        debug!(
            "Loaded package {} ({} items, {} in spine)",
            opf_path,
            package.manifest.len(),
            package.spine.len()
        );

        Ok(Self {
            container,
            opf_path,
            package,
        })
    }

    /// Archive path of the OPF package document.
    pub fn opf_path(&self) -> &str {
        &self.opf_path
    }

    pub fn container(&self) -> &EpubContainer {
        &self.container
    }

    /// Manifest items in manifest order.
    pub fn manifest(&self) -> &[ManifestItem] {
        &self.package.manifest
    }

    /// Content documents in manifest order.
    pub fn documents(&self) -> impl Iterator<Item = &ManifestItem> {
        self.package.manifest.iter().filter(|item| item.is_document())
    }

    /// Current spine `idref`s.
    pub fn spine(&self) -> &[String] {
        &self.package.spine
    }

    /// Names of the items in the current spine, in reading order.
    pub fn spine_names(&self) -> Vec<&str> {
        self.package
            .spine
            .iter()
            .filter_map(|id| self.package.item(id))
            .map(|item| item.name())
            .collect()
    }

    /// Raw bytes of a manifest item.
    pub fn content(&self, item: &ManifestItem) -> Result<&[u8]> {
        self.container.read_binary(&item.path)
    }

    /// Replaces the bytes of a manifest item in place.
    pub fn set_content(&mut self, item: &ManifestItem, data: Vec<u8>) -> Result<()> {
        self.container.replace(&item.path, data)
    }

    /// Replaces the spine and rewrites the package document to match.
    pub fn set_spine(&mut self, idrefs: Vec<String>) -> Result<()> {
        let opf = self.container.read_file(&self.opf_path)?;
        let rewritten = rewrite_spine(&opf, &idrefs)?;
        self.container.replace(&self.opf_path, rewritten.into_bytes())?;
        self.package.spine = idrefs;
        Ok(())
    }

    /// Serializes the archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.container.to_bytes()
    }

    /// Serializes the archive to a file.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = self.to_bytes()?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
