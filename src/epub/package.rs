//! OPF package document parsing and spine rewriting.

use crate::error::{Error, Result};
use log::warn;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

/// A manifest entry of the package document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// The `href` as written in the manifest; this is the item's name.
    pub href: String,
    /// Archive path of the item, resolved against the OPF directory.
    pub path: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    /// Name used for reporting and reading-order matching.
    pub fn name(&self) -> &str {
        &self.href
    }

    /// True for the EPUB 3 navigation document.
    pub fn is_nav(&self) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_whitespace().any(|p| p == "nav"))
    }

    /// True for (X)HTML content documents, excluding the navigation document.
    pub fn is_document(&self) -> bool {
        matches!(
            self.media_type.as_str(),
            "application/xhtml+xml" | "text/html"
        ) && !self.is_nav()
    }
}

/// Manifest and spine of a package document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// Manifest items in document order.
    pub manifest: Vec<ManifestItem>,
    /// Spine `idref`s in reading order.
    pub spine: Vec<String>,
}

impl Package {
    /// Looks up a manifest item by id.
    pub fn item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }
}

/// Extracts the first `rootfile/@full-path` from `META-INF/container.xml`.
pub fn parse_rootfile(container_xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(container_xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(path) = get_attr_string(&e, "full-path") {
                    return Ok(path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(Error::MissingComponent(
        "rootfile in META-INF/container.xml".into(),
    ))
}

/// Parses manifest and spine from an OPF document located at `opf_path`.
pub fn parse_package(opf: &str, opf_path: &str) -> Result<Package> {
    let base_dir = opf_path.rsplit_once('/').map_or("", |(dir, _)| dir);
    let mut reader = Reader::from_str(opf);
    reader.config_mut().trim_text(true);

    let mut package = Package::default();
    let mut in_manifest = false;
    let mut found_spine = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"manifest" => in_manifest = true,
                b"spine" => found_spine = true,
                b"item" if in_manifest => push_item(&mut package, &e, base_dir),
                b"itemref" => push_itemref(&mut package, &e),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"spine" => found_spine = true,
                b"item" if in_manifest => push_item(&mut package, &e, base_dir),
                b"itemref" => push_itemref(&mut package, &e),
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"manifest" => in_manifest = false,
            Event::Eof => break,
            _ => {}
        }
    }

    if !found_spine {
        return Err(Error::MissingComponent(format!("spine in {opf_path}")));
    }

    Ok(package)
}

fn push_item(package: &mut Package, e: &BytesStart<'_>, base_dir: &str) {
    let (Some(id), Some(href)) = (get_attr_string(e, "id"), get_attr_string(e, "href")) else {
        warn!("Skipping manifest item without id or href");
        return;
    };
    package.manifest.push(ManifestItem {
        path: resolve_href(base_dir, &href),
        id,
        href,
        media_type: get_attr_string(e, "media-type").unwrap_or_default(),
        properties: get_attr_string(e, "properties"),
    });
}

fn push_itemref(package: &mut Package, e: &BytesStart<'_>) {
    if let Some(idref) = get_attr_string(e, "idref") {
        package.spine.push(idref);
    }
}

/// Replaces the children of the OPF `<spine>` with one `itemref` per id.
///
/// Everything outside the spine, and the spine start tag with its
/// attributes (such as `toc`), is copied through unchanged.
pub fn rewrite_spine(opf: &str, idrefs: &[String]) -> Result<String> {
    let mut reader = Reader::from_str(opf);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut in_spine = false;
    let mut found_spine = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"spine" => {
                let prefix = tag_prefix(&e);
                writer.write_event(Event::Start(e))?;
                write_itemrefs(&mut writer, &prefix, idrefs)?;
                in_spine = true;
                found_spine = true;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"spine" => {
                let prefix = tag_prefix(&e);
                let end = e.to_end().into_owned();
                writer.write_event(Event::Start(e))?;
                write_itemrefs(&mut writer, &prefix, idrefs)?;
                writer.write_event(Event::Text(BytesText::from_escaped("\n  ")))?;
                writer.write_event(Event::End(end))?;
                found_spine = true;
            }
            Event::End(e) if e.local_name().as_ref() == b"spine" => {
                writer.write_event(Event::Text(BytesText::from_escaped("\n  ")))?;
                writer.write_event(Event::End(e))?;
                in_spine = false;
            }
            Event::Eof => break,
            // Old itemrefs and the whitespace between them
            _ if in_spine => {}
            event => writer.write_event(event)?,
        }
    }

    if !found_spine {
        return Err(Error::MissingComponent("spine".into()));
    }

    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

fn write_itemrefs(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    prefix: &str,
    idrefs: &[String],
) -> Result<()> {
    let tag = format!("{prefix}itemref");
    for idref in idrefs {
        writer.write_event(Event::Text(BytesText::from_escaped("\n    ")))?;
        let mut itemref = BytesStart::new(tag.as_str());
        itemref.push_attribute(("idref", idref.as_str()));
        writer.write_event(Event::Empty(itemref))?;
    }
    Ok(())
}

/// Namespace prefix of a tag including the colon, or empty.
fn tag_prefix(e: &BytesStart<'_>) -> String {
    e.name()
        .prefix()
        .map(|p| format!("{}:", String::from_utf8_lossy(p.as_ref())))
        .unwrap_or_default()
}

/// Resolves a manifest `href` against the directory of the package document.
///
/// Drops any fragment and normalizes `.` and `..` segments.
pub fn resolve_href(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();

    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            segment => parts.push(segment),
        }
    }

    parts.join("/")
}

/// Gets an attribute value by local name, with entities unescaped.
fn get_attr_string(e: &BytesStart<'_>, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name.as_bytes() {
            if let Ok(val) = attr.unescape_value() {
                return Some(val.into_owned());
            }
        }
    }
    None
}
