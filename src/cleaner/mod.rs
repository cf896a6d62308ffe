//! # Chapter Cleaner
//!
//! Turns a saved web-novel chapter page into a minimal XHTML chapter that
//! holds only the title and the story text.
//!
//! ## Pipeline
//!
//! 1. **Structural removal** - selector table, one phase at a time
//! 2. **Comment stripping**
//! 3. **Hidden elements** - inline `display: none`
//! 4. **Title** - heading with the title classes, then `<title>`, then `"Chapter"`
//! 5. **Body** - content container, then a chapter-like id, then the whole `<body>`
//! 6. **Container pruning** - promo links and empty elements
//! 7. **Re-emission** - fixed XHTML wrapper
//!
//! Cleaning never fails: the HTML parser recovers from malformed input and
//! the last fallback of each chain always produces something.

mod locate;
mod profile;
mod serialize;

pub use locate::{BodyLocator, BodySource, TitleLocator};
pub use profile::{BodyRule, CleanerProfile, Phase, RemovalRule, TitleRule};
pub use serialize::{escape_text, inner_xhtml, outer_xhtml};

use crate::error::Result;
use ego_tree::NodeId;
use locate::{class_list, compile_body_rule, compile_title_rule, parse_regex, parse_selector};
use log::debug;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Selector};
use serialize::is_void_element;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Elements kept by empty-element pruning even though they carry no text.
const KEPT_EMPTY: &[&str] = &["br", "hr", "img"];

/// An XML empty-element tag: name, attributes, `/>`.
static SELF_CLOSING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<([A-Za-z][A-Za-z0-9:._-]*)((?:\s+[^\s"'<>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'<>/=`]+))?)*)\s*/>"#,
    )
    .unwrap()
});

static DEFAULT_CLEANER: LazyLock<ChapterCleaner> =
    LazyLock::new(|| ChapterCleaner::new(CleanerProfile::voz()).unwrap());

/// Cleans one chapter page with the default profile.
///
/// # Example
///
/// ```
/// let page = r#"<h1 class="text-lg font-bold text-center">Ch1</h1>
///     <div id="content"><p>Hello</p><script>x</script></div>"#;
/// let xhtml = epub_tidy::clean(page);
/// assert!(xhtml.contains(r#"<h1>Ch1</h1><div id="content"><p>Hello</p></div>"#));
/// ```
pub fn clean(markup: &str) -> String {
    DEFAULT_CLEANER.clean(markup)
}

/// Title and body extracted from a chapter page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedChapter {
    /// Plain-text title; escaped when emitted.
    pub title: String,
    /// Serialized XHTML fragment; emitted verbatim.
    pub body: String,
    pub body_source: BodySource,
}

impl CleanedChapter {
    /// Wraps the chapter in the fixed standalone XHTML document.
    pub fn to_xhtml(&self) -> String {
        let title = escape_text(&self.title);
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
    <meta charset="utf-8" />
    <title>{title}</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; margin: 20px; }}
        h1 {{ text-align: center; color: #333; margin-bottom: 20px; }}
        p {{ margin-bottom: 15px; text-align: justify; }}
    </style>
</head>
<body>
    <h1>{title}</h1>{body}
</body>
</html>"#,
            body = self.body
        )
    }
}

/// A compiled [`CleanerProfile`].
pub struct ChapterCleaner {
    profile_name: &'static str,
    /// Removal selectors, already in phase order.
    removals: Vec<(Phase, &'static str, Selector)>,
    styled: Selector,
    hidden_style: Regex,
    title_locators: Vec<Box<dyn TitleLocator>>,
    default_title: &'static str,
    body_locators: Vec<Box<dyn BodyLocator>>,
    anchor: Selector,
    promo_link: Option<Regex>,
}

impl std::fmt::Debug for ChapterCleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChapterCleaner")
            .field("profile", &self.profile_name)
            .field("removals", &self.removals.len())
            .field("title_locators", &self.title_locators.len())
            .field("body_locators", &self.body_locators.len())
            .finish()
    }
}

impl ChapterCleaner {
    /// Compiles a profile.
    ///
    /// Fails with [`Error::InvalidData`](crate::Error::InvalidData) if a
    /// selector or pattern in the profile does not parse.
    pub fn new(profile: CleanerProfile) -> Result<Self> {
        let mut removals = Vec::with_capacity(profile.removal_rules.len());
        for phase in Phase::ALL {
            for rule in profile.rules_for(phase) {
                removals.push((phase, rule.selector, parse_selector(rule.selector)?));
            }
        }

        let title_locators = profile
            .title_rules
            .iter()
            .map(compile_title_rule)
            .collect::<Result<Vec<_>>>()?;
        let body_locators = profile
            .body_rules
            .iter()
            .map(compile_body_rule)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            profile_name: profile.name,
            removals,
            styled: parse_selector("[style]")?,
            hidden_style: parse_regex(profile.hidden_style_pattern)?,
            title_locators,
            default_title: profile.default_title,
            body_locators,
            anchor: parse_selector("a")?,
            promo_link: profile.promo_link_pattern.map(parse_regex).transpose()?,
        })
    }

    /// The cleaner for the default profile, compiled once.
    pub fn shared() -> &'static ChapterCleaner {
        &DEFAULT_CLEANER
    }

    /// Cleans a chapter page into a standalone XHTML document.
    pub fn clean(&self, markup: &str) -> String {
        self.extract(markup).to_xhtml()
    }

    /// Runs the pipeline and returns the extracted parts without the wrapper.
    pub fn extract(&self, markup: &str) -> CleanedChapter {
        let mut document = Html::parse_document(&expand_self_closing(markup));

        self.remove_structural(&mut document);
        remove_comments(&mut document);
        self.remove_hidden(&mut document);

        let title = self.locate_title(&document);
        let (body, body_source) = self.extract_body(&mut document);

        CleanedChapter {
            title,
            body,
            body_source,
        }
    }

    fn remove_structural(&self, document: &mut Html) {
        for (phase, source, selector) in &self.removals {
            let ids: Vec<NodeId> = document.select(selector).map(|el| el.id()).collect();
            let removed = detach_all(document, ids);
            if removed > 0 {
                debug!("[{}] removed {} {} ({})", self.profile_name, removed, source, phase);
            }
        }
    }

    fn remove_hidden(&self, document: &mut Html) {
        let ids: Vec<NodeId> = document
            .select(&self.styled)
            .filter(|el| {
                el.value()
                    .attr("style")
                    .is_some_and(|style| self.hidden_style.is_match(style))
            })
            .map(|el| el.id())
            .collect();
        let removed = detach_all(document, ids);
        if removed > 0 {
            debug!("[{}] removed {} hidden elements", self.profile_name, removed);
        }
    }

    fn locate_title(&self, document: &Html) -> String {
        for locator in &self.title_locators {
            if let Some(title) = locator.locate(document) {
                debug!("[{}] title from {}", self.profile_name, locator.name());
                return title;
            }
        }
        debug!("[{}] no title found, using default", self.profile_name);
        self.default_title.to_string()
    }

    fn extract_body(&self, document: &mut Html) -> (String, BodySource) {
        for locator in &self.body_locators {
            let Some(id) = locator.locate(document).map(|el| el.id()) else {
                continue;
            };
            let source = locator.source();
            debug!("[{}] body from {:?}", self.profile_name, source);

            if source.is_container() {
                self.prune_container(document, id);
            }

            let Some(element) = document.tree.get(id).and_then(ElementRef::wrap) else {
                continue;
            };
            let body = match source {
                // Wrapped so a second pass picks the same fragment as a container
                BodySource::WholeBody => {
                    format!(r#"<div id="content">{}</div>"#, inner_xhtml(element))
                }
                _ => outer_xhtml(element),
            };
            return (body, source);
        }

        (String::new(), BodySource::WholeBody)
    }

    /// Removes promo links, then every descendant with no visible content.
    ///
    /// One pass is enough: emptiness is judged on the text of the whole
    /// subtree, so a wrapper around empty elements is itself empty.
    fn prune_container(&self, document: &mut Html, container: NodeId) {
        if let Some(pattern) = &self.promo_link {
            let ids: Vec<NodeId> = match document.tree.get(container).and_then(ElementRef::wrap) {
                Some(element) => element
                    .select(&self.anchor)
                    .filter(|a| pattern.is_match(&class_list(a)))
                    .map(|a| a.id())
                    .collect(),
                None => return,
            };
            let removed = detach_all(document, ids);
            if removed > 0 {
                debug!("[{}] removed {} promo links", self.profile_name, removed);
            }
        }

        let ids: Vec<NodeId> = match document.tree.get(container) {
            Some(node) => node
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .filter(|el| is_empty_element(*el))
                .map(|el| el.id())
                .collect(),
            None => return,
        };
        let removed = detach_all(document, ids);
        if removed > 0 {
            debug!("[{}] pruned {} empty elements", self.profile_name, removed);
        }
    }
}

/// Rewrites `<tag .../>` as `<tag ...></tag>` for every non-void tag.
///
/// Chapters are XHTML, but the HTML parser ignores the self-closing flag:
/// `<script src="a.js"/>` would swallow the rest of the page as script text
/// and `<div/>` would adopt its following siblings.
fn expand_self_closing(markup: &str) -> Cow<'_, str> {
    SELF_CLOSING_TAG.replace_all(markup, |caps: &Captures<'_>| {
        let name = &caps[1];
        let attrs = caps.get(2).map_or("", |m| m.as_str());
        if is_void_element(name) {
            caps[0].to_string()
        } else {
            format!("<{name}{attrs}></{name}>")
        }
    })
}

fn remove_comments(document: &mut Html) {
    let ids: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter(|node| node.value().is_comment())
        .map(|node| node.id())
        .collect();
    detach_all(document, ids);
}

fn is_empty_element(element: ElementRef<'_>) -> bool {
    if KEPT_EMPTY.contains(&element.value().name()) {
        return false;
    }
    if !element.text().all(|t| t.trim().is_empty()) {
        return false;
    }
    !element
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|d| KEPT_EMPTY.contains(&d.value().name()))
}

/// Detaches nodes (and their subtrees) from the tree, returning how many.
fn detach_all(document: &mut Html, ids: Vec<NodeId>) -> usize {
    let mut count = 0;
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            if node.parent().is_some() {
                node.detach();
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE_H1: &str = r#"<h1 class="text-lg font-bold text-center">Ch1</h1>"#;

    fn page(head: &str, body: &str) -> String {
        format!("<html><head>{head}</head><body>{body}</body></html>")
    }

    fn body_of(xhtml: &str) -> &str {
        let start = xhtml.find("<body>").unwrap();
        &xhtml[start..]
    }

    #[test]
    fn test_reference_example() {
        let input = page(
            "",
            &format!(r#"{TITLE_H1}<div id="content"><p>Hello</p><script>x</script></div>"#),
        );
        let out = clean(&input);
        assert!(out.contains(r#"<h1>Ch1</h1><div id="content"><p>Hello</p></div>"#));
        assert!(!out.contains("<script"));
    }

    #[test]
    fn test_chrome_is_removed() {
        let input = page(
            "<style>body{}</style><script>track()</script>",
            r##"<div class="bg-black">NAVBAR</div>
                <div class="bg-gray-200">Home / Story</div>
                <button id="theme-toggle">Dark</button>
                <div id="content"><p>Story text</p>
                    <div id="binh-luan">COMMENTS</div>
                    <form><input name="q"></form>
                </div>
                <a href="/post/create">Post a story</a>
                <div class="bg-white shadow">SUGGESTED</div>
                <div class="bg-siver-001">FOOTER</div>"##,
        );
        let out = clean(&input);
        for gone in [
            "NAVBAR",
            "Home / Story",
            "theme-toggle",
            "COMMENTS",
            "<form",
            "<input",
            "Post a story",
            "SUGGESTED",
            "FOOTER",
            "<script",
            "track()",
        ] {
            assert!(!out.contains(gone), "{gone} survived");
        }
        assert!(out.contains("<p>Story text</p>"));
    }

    #[test]
    fn test_comments_are_stripped() {
        let input = page("<!-- head note -->", r#"<div id="content"><p>A</p><!-- secret --></div>"#);
        let out = clean(&input);
        assert!(!out.contains("<!--"));
        assert!(!out.contains("secret"));
        assert!(!out.contains("head note"));
    }

    #[test]
    fn test_hidden_elements_any_case_and_spacing() {
        let input = page(
            "",
            r#"<div id="content">
                <p>Visible</p>
                <p style="display:none">secret-one</p>
                <p style="color: red; Display:   NONE">secret-two</p>
                <span style="DISPLAY:none;">secret-three</span>
                <p style="display: block">Shown</p>
            </div>"#,
        );
        let out = clean(&input);
        assert!(out.contains("Visible"));
        assert!(out.contains("Shown"));
        for hidden in ["secret-one", "secret-two", "secret-three"] {
            assert!(!out.contains(hidden), "{hidden} survived");
        }
    }

    #[test]
    fn test_heading_beats_title_element() {
        let input = page(
            "<title>Site - Story - Ch1</title>",
            &format!(r#"{TITLE_H1}<div id="content"><p>x</p></div>"#),
        );
        let chapter = ChapterCleaner::shared().extract(&input);
        assert_eq!(chapter.title, "Ch1");
    }

    #[test]
    fn test_title_element_fallback() {
        let input = page(
            "<title>  Only Title  </title>",
            r#"<h1 class="other">Not this</h1><div id="content"><p>x</p></div>"#,
        );
        let out = clean(&input);
        assert!(out.contains("<title>Only Title</title>"));
        assert!(out.contains("<h1>Only Title</h1>"));
    }

    #[test]
    fn test_default_title_still_emits_heading() {
        let out = clean(&page("", r#"<div id="content"><p>x</p></div>"#));
        assert!(out.contains("<title>Chapter</title>"));
        assert!(out.contains("<h1>Chapter</h1>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let out = clean(&page("<title>A &amp; B &lt;3</title>", ""));
        assert!(out.contains("<h1>A &amp; B &lt;3</h1>"));
    }

    #[test]
    fn test_content_container_beats_chapter_id() {
        let input = page(
            "",
            r#"<div id="chapter-body"><p>Wrong</p></div><div id="content"><p>Right</p></div>"#,
        );
        let chapter = ChapterCleaner::shared().extract(&input);
        assert_eq!(chapter.body_source, BodySource::ContentContainer);
        assert_eq!(chapter.body, r#"<div id="content"><p>Right</p></div>"#);
    }

    #[test]
    fn test_chapter_id_fallback() {
        let input = page("", r#"<div id="nav">menu</div><div id="Chapter_12"><p>Text</p></div>"#);
        let chapter = ChapterCleaner::shared().extract(&input);
        assert_eq!(chapter.body_source, BodySource::ChapterContainer);
        assert_eq!(chapter.body, r#"<div id="Chapter_12"><p>Text</p></div>"#);
    }

    #[test]
    fn test_whole_body_fallback_is_not_pruned() {
        let input = page("<title>T</title>", "<p>Loose text</p><p></p><span></span>");
        let chapter = ChapterCleaner::shared().extract(&input);
        assert_eq!(chapter.body_source, BodySource::WholeBody);
        assert_eq!(
            chapter.body,
            r#"<div id="content"><p>Loose text</p><p></p><span></span></div>"#
        );
    }

    #[test]
    fn test_promo_links_and_empty_elements_pruned() {
        let input = page(
            "",
            r#"<div id="content"><p>Text</p><p>  </p><div><span></span></div><p><img src="a.png"></p><br><a class="font-bold text-green-001" href="/story">Read more stories</a></div>"#,
        );
        let chapter = ChapterCleaner::shared().extract(&input);
        assert_eq!(
            chapter.body,
            r#"<div id="content"><p>Text</p><p><img src="a.png" /></p><br /></div>"#
        );
    }

    #[test]
    fn test_nested_empty_containers_go_in_one_pass() {
        let input = page(
            "",
            r#"<div id="content"><div><div><p> </p></div></div><p>kept</p></div>"#,
        );
        let chapter = ChapterCleaner::shared().extract(&input);
        assert_eq!(chapter.body, r#"<div id="content"><p>kept</p></div>"#);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let input = page(
            "<title>Site</title><style>p{}</style>",
            &format!(
                r#"<div class="bg-black">nav</div>{TITLE_H1}<div id="content"><p>One</p>
<p>Two &amp; three</p><p><br></p><!-- c --></div>"#
            ),
        );
        let once = clean(&input);
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_whole_body_output_recleans_to_same_body() {
        let once = clean(&page("<title>Loose</title>", "<p>Only paragraph</p>"));
        let twice = clean(&once);
        assert_eq!(body_of(&once), body_of(&twice));
    }

    #[test]
    fn test_self_closed_script_keeps_following_content() {
        let input = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>T</title>
<script type="text/javascript" src="a.js"/></head>
<body>{TITLE_H1}<div id="content"><p>Hello story</p></div></body></html>"#
        );
        let out = clean(&input);
        assert!(out.contains("<p>Hello story</p>"), "chapter text lost: {out}");
        assert!(out.contains("<h1>Ch1</h1>"));
        assert!(!out.contains("a.js"));
    }

    #[test]
    fn test_self_closed_chrome_does_not_adopt_siblings() {
        let input = page(
            "<title>T</title>",
            &format!(
                r#"<div class="float-left"/>{TITLE_H1}<div id="content"><p>Text<br/>more</p><span class="gap"/></div>"#
            ),
        );
        let chapter = ChapterCleaner::shared().extract(&input);
        assert_eq!(chapter.title, "Ch1");
        assert_eq!(chapter.body, r#"<div id="content"><p>Text<br />more</p></div>"#);
    }

    #[test]
    fn test_expand_self_closing() {
        assert_eq!(
            expand_self_closing(r#"<script src="a.js"/><br/><img src="x.png" /><div class='a' />"#),
            r#"<script src="a.js"></script><br/><img src="x.png" /><div class='a'></div>"#
        );
        assert!(matches!(expand_self_closing("<p>plain</p>"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_malformed_markup_still_cleans() {
        let out = clean(r#"<div id="content"><p>Unclosed <b>bold<p>next</div></span>"#);
        assert!(out.starts_with("<?xml"));
        assert!(out.contains("Unclosed"));
        assert!(out.contains("next"));
        assert!(out.contains("<h1>Chapter</h1>"));
    }

    #[test]
    fn test_empty_input() {
        let out = clean("");
        assert!(out.contains("<h1>Chapter</h1>"));
        assert!(out.contains(r#"<div id="content"></div>"#));
    }

    #[test]
    fn test_custom_profile() {
        const RULES: &[RemovalRule] = &[RemovalRule::new("aside", Phase::Related)];
        const BODY: &[BodyRule] = &[
            BodyRule::Container { selector: "article" },
            BodyRule::WholeBody,
        ];
        let profile = CleanerProfile {
            name: "custom",
            removal_rules: RULES,
            body_rules: BODY,
            promo_link_pattern: None,
            ..CleanerProfile::voz()
        };
        let cleaner = ChapterCleaner::new(profile).unwrap();
        let chapter = cleaner.extract(
            r#"<article><p>Story</p><aside>Ad</aside><a class="font-bold text-green-001">L</a></article>"#,
        );
        assert_eq!(chapter.body_source, BodySource::ContentContainer);
        assert_eq!(
            chapter.body,
            r#"<article><p>Story</p><a class="font-bold text-green-001">L</a></article>"#
        );
    }
}
