//! Options for archive processing.

/// Name fragments marking a document as story content.
///
/// `chuong` is the unaccented Vietnamese "chương" (chapter).
pub const DEFAULT_SPINE_KEYWORDS: &[&str] = &["chapter", "text", "chuong"];

/// Options for controlling archive processing.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Emit a progress event every this many cleaned documents (0 = never).
    pub progress_interval: usize,

    /// Lower-case fragments; a document joins the rebuilt reading order
    /// when its name contains any of them.
    pub spine_keywords: Vec<String>,

    /// Whether to rebuild the reading order after cleaning.
    pub rebuild_spine: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            progress_interval: 100,
            spine_keywords: DEFAULT_SPINE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            rebuild_spine: true,
        }
    }
}

impl ProcessOptions {
    /// Creates new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how often progress is reported.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Replaces the reading-order keywords. Matching is case-insensitive.
    pub fn with_spine_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.spine_keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Leaves the original reading order untouched.
    pub fn keep_spine(mut self) -> Self {
        self.rebuild_spine = false;
        self
    }

    /// Returns true if a document with this name belongs in the reading order.
    pub fn is_reading_order_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.spine_keywords.iter().any(|k| name.contains(k.as_str()))
    }

    /// Returns true if `processed` lands on a progress reporting boundary.
    pub fn should_report(&self, processed: usize) -> bool {
        self.progress_interval > 0 && processed % self.progress_interval == 0
    }
}
