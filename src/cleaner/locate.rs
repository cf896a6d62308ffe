//! Title and body locators.
//!
//! Each locator is one strategy of a fallback chain: it either finds its
//! target in the parsed page or reports nothing, and the cleaner moves on
//! to the next one.

use super::profile::{BodyRule, TitleRule};
use crate::error::{Error, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Finds the chapter title in a parsed page.
pub trait TitleLocator: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Returns the trimmed title text, or `None` if this strategy misses.
    fn locate(&self, document: &Html) -> Option<String>;
}

/// Finds the element holding the chapter body.
pub trait BodyLocator: Send + Sync {
    /// Which kind of fragment this locator yields.
    fn source(&self) -> BodySource;

    fn locate<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>>;
}

/// Where the emitted body fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySource {
    /// The canonical content container (`div#content` by default).
    ContentContainer,
    /// A container whose id looks like a chapter id.
    ChapterContainer,
    /// No container found; the whole `<body>` is passed through.
    WholeBody,
}

impl BodySource {
    /// Whether the fragment gets promo-link and empty-element pruning.
    pub fn is_container(self) -> bool {
        !matches!(self, BodySource::WholeBody)
    }
}

/// Compiles one title rule into its locator.
pub(crate) fn compile_title_rule(rule: &TitleRule) -> Result<Box<dyn TitleLocator>> {
    Ok(match *rule {
        TitleRule::HeadingClass { tag, class_pattern } => Box::new(HeadingClassTitle {
            selector: parse_selector(tag)?,
            class_pattern: parse_regex(class_pattern)?,
        }),
        TitleRule::TitleElement => Box::new(TitleElementTitle {
            selector: parse_selector("title")?,
        }),
    })
}

/// Compiles one body rule into its locator.
pub(crate) fn compile_body_rule(rule: &BodyRule) -> Result<Box<dyn BodyLocator>> {
    Ok(match *rule {
        BodyRule::Container { selector } => Box::new(ContainerBody {
            selector: parse_selector(selector)?,
        }),
        BodyRule::IdPattern { tag, id_pattern } => Box::new(IdPatternBody {
            selector: parse_selector(&format!("{tag}[id]"))?,
            id_pattern: parse_regex(id_pattern)?,
        }),
        BodyRule::WholeBody => Box::new(WholeBody {
            selector: parse_selector("body")?,
        }),
    })
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| Error::InvalidData(format!("invalid selector {selector:?}: {e:?}")))
}

pub(crate) fn parse_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidData(format!("invalid pattern {pattern:?}: {e}")))
}

/// Space-joined class list, the form class patterns are matched against.
pub(crate) fn class_list(element: &ElementRef<'_>) -> String {
    element.value().classes().collect::<Vec<_>>().join(" ")
}

fn trimmed_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

struct HeadingClassTitle {
    selector: Selector,
    class_pattern: Regex,
}

impl TitleLocator for HeadingClassTitle {
    fn name(&self) -> &'static str {
        "heading-class"
    }

    fn locate(&self, document: &Html) -> Option<String> {
        document
            .select(&self.selector)
            .find(|el| self.class_pattern.is_match(&class_list(el)))
            .and_then(trimmed_text)
    }
}

struct TitleElementTitle {
    selector: Selector,
}

impl TitleLocator for TitleElementTitle {
    fn name(&self) -> &'static str {
        "title-element"
    }

    fn locate(&self, document: &Html) -> Option<String> {
        document.select(&self.selector).next().and_then(trimmed_text)
    }
}

struct ContainerBody {
    selector: Selector,
}

impl BodyLocator for ContainerBody {
    fn source(&self) -> BodySource {
        BodySource::ContentContainer
    }

    fn locate<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document.select(&self.selector).next()
    }
}

struct IdPatternBody {
    selector: Selector,
    id_pattern: Regex,
}

impl BodyLocator for IdPatternBody {
    fn source(&self) -> BodySource {
        BodySource::ChapterContainer
    }

    fn locate<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document.select(&self.selector).find(|el| {
            el.value()
                .attr("id")
                .is_some_and(|id| self.id_pattern.is_match(id))
        })
    }
}

struct WholeBody {
    selector: Selector,
}

impl BodyLocator for WholeBody {
    fn source(&self) -> BodySource {
        BodySource::WholeBody
    }

    fn locate<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document.select(&self.selector).next()
    }
}
