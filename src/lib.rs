//! # epub-tidy
//!
//! Strips site chrome (navigation, comment widgets, scripts, promotional
//! links) from web-novel chapter pages bundled in an EPUB, keeping only the
//! chapter title and story text, and repackages a clean archive.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> epub_tidy::Result<()> {
//!     let summary = epub_tidy::clean_epub("input.epub", "out_cleaned.epub")?;
//!
//!     println!("Cleaned {}/{} chapters", summary.processed, summary.total);
//!     for failure in &summary.failures {
//!         eprintln!("{}: {}", failure.name, failure.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Single pages can be cleaned without an archive:
//!
//! ```
//! let xhtml = epub_tidy::clean(r#"<div id="content"><p>Hello</p></div>"#);
//! assert!(xhtml.contains("<h1>Chapter</h1>"));
//! ```
//!
//! ## Components
//!
//! - [`cleaner`]: the page-level cleaning pipeline and its site profiles
//! - [`epub`]: EPUB container and package document handling
//! - [`ArchiveProcessor`]: applies the cleaner to a whole archive

pub mod cleaner;
pub mod epub;
pub mod error;
pub mod options;
pub mod processor;

// Re-exports
pub use cleaner::{clean, BodySource, ChapterCleaner, CleanedChapter, CleanerProfile};
pub use epub::Epub;
pub use error::{Error, Result};
pub use options::ProcessOptions;
pub use processor::{ArchiveProcessor, Failure, Progress, Summary};

use std::path::Path;

/// Cleans every chapter of `input` and writes the result to `output`,
/// using the default profile and options.
///
/// Documents that fail are left unchanged and listed in
/// [`Summary::failures`].
pub fn clean_epub(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<Summary> {
    ArchiveProcessor::new().process(input, output)
}

/// Cleans every chapter of an EPUB held in memory and returns the new archive.
pub fn clean_epub_bytes(data: Vec<u8>) -> Result<(Vec<u8>, Summary)> {
    let mut epub = Epub::from_bytes(data)?;
    let summary = ArchiveProcessor::new().process_epub(&mut epub)?;
    Ok((epub.to_bytes()?, summary))
}

/// Builder for cleaning an archive with non-default settings.
///
/// # Example
///
/// ```no_run
/// use epub_tidy::EpubTidy;
///
/// let summary = EpubTidy::new()
///     .with_spine_keywords(["chapter", "chuong"])
///     .with_progress_interval(10)
///     .run("input.epub", "out_cleaned.epub")?;
/// # Ok::<(), epub_tidy::Error>(())
/// ```
pub struct EpubTidy {
    profile: CleanerProfile,
    options: ProcessOptions,
}

impl Default for EpubTidy {
    fn default() -> Self {
        Self::new()
    }
}

impl EpubTidy {
    /// Creates a builder with the default profile and options.
    pub fn new() -> Self {
        Self {
            profile: CleanerProfile::default(),
            options: ProcessOptions::default(),
        }
    }

    /// Uses a different site profile.
    pub fn with_profile(mut self, profile: CleanerProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Sets the reading-order keywords.
    pub fn with_spine_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.options = self.options.with_spine_keywords(keywords);
        self
    }

    /// Sets how often progress is logged.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.options = self.options.with_progress_interval(interval);
        self
    }

    /// Keeps the original reading order.
    pub fn keep_spine(mut self) -> Self {
        self.options = self.options.keep_spine();
        self
    }

    /// Compiles the profile and processes the archive.
    pub fn run(self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<Summary> {
        let cleaner = ChapterCleaner::new(self.profile)?;
        ArchiveProcessor::with_cleaner(&cleaner)
            .with_options(self.options)
            .process(input, output)
    }
}
