//! Archive-level driver: cleans every document of an EPUB and rebuilds its
//! reading order.

use crate::cleaner::ChapterCleaner;
use crate::epub::{Epub, ManifestItem};
use crate::error::{Error, Result};
use crate::options::ProcessOptions;
use log::{info, warn};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// A document that could not be cleaned and was left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub name: String,
    pub message: String,
}

/// Outcome of processing one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Number of content documents found.
    pub total: usize,
    /// Number of documents cleaned successfully.
    pub processed: usize,
    /// Documents that failed, in processing order.
    pub failures: Vec<Failure>,
    /// Length of the reading order that was written.
    pub reading_order: usize,
}

impl Summary {
    /// Returns true if every document was cleaned.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Progress events reported while processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'a> {
    /// The archive was read; `total` documents will be cleaned.
    Started { total: usize },
    /// Reported every `progress_interval` cleaned documents.
    Cleaned { processed: usize, total: usize },
    /// A document failed and was skipped.
    Failed { name: &'a str, message: &'a str },
    /// All documents are done; the reading order is being rebuilt.
    RebuildingSpine,
    /// The output archive is being written.
    Writing { path: &'a Path },
}

/// Cleans every content document of an EPUB archive.
///
/// # Example
///
/// ```no_run
/// use epub_tidy::{ArchiveProcessor, ProcessOptions};
///
/// let summary = ArchiveProcessor::new()
///     .with_options(ProcessOptions::new().with_progress_interval(50))
///     .process("input.epub", "out_cleaned.epub")?;
/// println!("{}/{} chapters", summary.processed, summary.total);
/// # Ok::<(), epub_tidy::Error>(())
/// ```
#[derive(Debug)]
pub struct ArchiveProcessor<'c> {
    cleaner: &'c ChapterCleaner,
    options: ProcessOptions,
}

impl Default for ArchiveProcessor<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveProcessor<'static> {
    /// Creates a processor using the default cleaner profile.
    pub fn new() -> Self {
        Self::with_cleaner(ChapterCleaner::shared())
    }
}

impl<'c> ArchiveProcessor<'c> {
    /// Creates a processor using a custom cleaner.
    pub fn with_cleaner(cleaner: &'c ChapterCleaner) -> Self {
        Self {
            cleaner,
            options: ProcessOptions::default(),
        }
    }

    /// Sets processing options.
    pub fn with_options(mut self, options: ProcessOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Cleans `input` and writes the result to `output`.
    ///
    /// Per-document failures are collected in the returned [`Summary`];
    /// only an unreadable input or an unwritable output is an error.
    pub fn process(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<Summary> {
        self.process_with_progress(input, output, |_| {})
    }

    /// Like [`process`](Self::process), reporting [`Progress`] along the way.
    pub fn process_with_progress<F>(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        mut progress: F,
    ) -> Result<Summary>
    where
        F: FnMut(Progress<'_>),
    {
        let input = input.as_ref();
        let output = output.as_ref();

        info!("Reading {}", input.display());
        let mut epub = Epub::open(input)?;

        let summary = self.run(&mut epub, &mut progress)?;

        progress(Progress::Writing { path: output });
        info!("Writing {}", output.display());
        epub.write_to_path(output)?;

        Ok(summary)
    }

    /// Cleans an already-opened archive in memory.
    pub fn process_epub(&self, epub: &mut Epub) -> Result<Summary> {
        self.run(epub, &mut |_| {})
    }

    fn run(&self, epub: &mut Epub, progress: &mut dyn FnMut(Progress<'_>)) -> Result<Summary> {
        let documents: Vec<ManifestItem> = epub.documents().cloned().collect();
        let mut summary = Summary {
            total: documents.len(),
            ..Default::default()
        };

        info!("{} documents to clean", summary.total);
        progress(Progress::Started {
            total: summary.total,
        });

        for item in &documents {
            match self.clean_document(epub, item) {
                Ok(()) => {
                    summary.processed += 1;
                    if self.options.should_report(summary.processed) {
                        info!("Cleaned {}/{}", summary.processed, summary.total);
                        progress(Progress::Cleaned {
                            processed: summary.processed,
                            total: summary.total,
                        });
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!("Failed to clean {}: {}", item.name(), message);
                    progress(Progress::Failed {
                        name: item.name(),
                        message: &message,
                    });
                    summary.failures.push(Failure {
                        name: item.name().to_string(),
                        message,
                    });
                }
            }
        }

        if self.options.rebuild_spine {
            progress(Progress::RebuildingSpine);
            let idrefs: Vec<String> = documents
                .iter()
                .filter(|item| self.options.is_reading_order_name(item.name()))
                .map(|item| item.id.clone())
                .collect();
            if idrefs.is_empty() {
                warn!("No document name matches the reading-order keywords; spine is now empty");
            }
            epub.set_spine(idrefs)?;
        }
        summary.reading_order = epub.spine().len();

        Ok(summary)
    }

    fn clean_document(&self, epub: &mut Epub, item: &ManifestItem) -> Result<()> {
        let markup = std::str::from_utf8(epub.content(item)?)?;
        let cleaner = self.cleaner;
        let cleaned = panic::catch_unwind(AssertUnwindSafe(|| cleaner.clean(markup)))
            .map_err(|payload| Error::Cleaning(panic_message(payload.as_ref())))?;
        epub.set_content(item, cleaned.into_bytes())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during cleaning".to_string()
    }
}
