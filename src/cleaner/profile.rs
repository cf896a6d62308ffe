//! Site profiles: the selector tables and locator chains the cleaner runs.
//!
//! A profile is plain data. [`ChapterCleaner::new`](super::ChapterCleaner::new)
//! compiles it once; supporting another site layout means writing another
//! profile, not touching the cleaning pipeline.

/// Removal phase a rule belongs to.
///
/// Phases run in declaration order. Rules within one phase never overlap,
/// so their relative order does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Navigation bars, breadcrumbs, logos, theme toggles.
    Header,
    /// Buttons, comment widgets, forms.
    Interactive,
    /// "Back to story" links, recommendations, footers.
    Related,
    /// `<style>` and `<script>` elements.
    StyleScript,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 4] = [
        Phase::Header,
        Phase::Interactive,
        Phase::Related,
        Phase::StyleScript,
    ];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Header => write!(f, "header/nav"),
            Phase::Interactive => write!(f, "interactive/forms"),
            Phase::Related => write!(f, "related-content/footer"),
            Phase::StyleScript => write!(f, "style/script"),
        }
    }
}

/// A CSS selector whose matches are removed together with their subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalRule {
    pub selector: &'static str,
    pub phase: Phase,
}

impl RemovalRule {
    pub const fn new(selector: &'static str, phase: Phase) -> Self {
        Self { selector, phase }
    }
}

/// One step of the title fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    /// A heading element whose class list matches a regex.
    HeadingClass {
        tag: &'static str,
        class_pattern: &'static str,
    },
    /// The document's `<title>` text.
    TitleElement,
}

/// One step of the body fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRule {
    /// The canonical content container, found by CSS selector.
    Container { selector: &'static str },
    /// An element of `tag` whose `id` matches a regex.
    IdPattern {
        tag: &'static str,
        id_pattern: &'static str,
    },
    /// The whole `<body>`, emitted without pruning.
    WholeBody,
}

/// Everything site-specific about cleaning a chapter page.
#[derive(Debug, Clone)]
pub struct CleanerProfile {
    /// Short name used in log output.
    pub name: &'static str,
    pub removal_rules: &'static [RemovalRule],
    /// Inline style pattern marking an element as hidden.
    pub hidden_style_pattern: &'static str,
    pub title_rules: &'static [TitleRule],
    /// Title used when every title rule misses.
    pub default_title: &'static str,
    pub body_rules: &'static [BodyRule],
    /// Class pattern of promotional `<a>` elements inside the body.
    pub promo_link_pattern: Option<&'static str>,
}

impl Default for CleanerProfile {
    fn default() -> Self {
        Self::voz()
    }
}

impl CleanerProfile {
    /// Profile for chapter pages saved from the VOZ novel reader layout.
    pub fn voz() -> Self {
        Self {
            name: "voz",
            removal_rules: VOZ_REMOVAL_RULES,
            hidden_style_pattern: r"(?i)display:\s*none",
            title_rules: VOZ_TITLE_RULES,
            default_title: "Chapter",
            body_rules: VOZ_BODY_RULES,
            promo_link_pattern: Some(r"(?i)font-bold.*text-green-001"),
        }
    }

    /// Returns the rules of a single phase, in table order.
    pub fn rules_for(&self, phase: Phase) -> impl Iterator<Item = &RemovalRule> + '_ {
        self.removal_rules.iter().filter(move |r| r.phase == phase)
    }
}

const VOZ_REMOVAL_RULES: &[RemovalRule] = &[
    // Header and navigation
    RemovalRule::new("div.bg-black", Phase::Header),
    RemovalRule::new("div.bg-gray-200", Phase::Header),
    RemovalRule::new("button#theme-toggle", Phase::Header),
    RemovalRule::new("div.float-left", Phase::Header),
    RemovalRule::new("div.float-right", Phase::Header),
    // Read-aloud button, comments, forms
    RemovalRule::new("a#readButton", Phase::Interactive),
    RemovalRule::new("#binh-luan", Phase::Interactive),
    RemovalRule::new("#comment-form", Phase::Interactive),
    RemovalRule::new("#comments-wrapper", Phase::Interactive),
    RemovalRule::new("form", Phase::Interactive),
    // Back-to-story link, "post a story" button, suggestions, footer
    RemovalRule::new("div.bg-green-001", Phase::Related),
    RemovalRule::new(r#"a[href*="post/create"]"#, Phase::Related),
    RemovalRule::new("div.bg-white.shadow", Phase::Related),
    RemovalRule::new("div.bg-siver-001", Phase::Related),
    RemovalRule::new("div.flex-1", Phase::Related),
    RemovalRule::new("style", Phase::StyleScript),
    RemovalRule::new("script", Phase::StyleScript),
];

const VOZ_TITLE_RULES: &[TitleRule] = &[
    TitleRule::HeadingClass {
        tag: "h1",
        class_pattern: r"(?i)text-lg.*font-bold.*text-center",
    },
    TitleRule::TitleElement,
];

const VOZ_BODY_RULES: &[BodyRule] = &[
    BodyRule::Container {
        selector: "div#content",
    },
    BodyRule::IdPattern {
        tag: "div",
        id_pattern: r"(?i)chapter",
    },
    BodyRule::WholeBody,
];
