//! XHTML serialization of parsed fragments.
//!
//! EPUB readers parse chapters as XML, so void elements are written
//! self-closed and every text and attribute value is escaped.

use scraper::{ElementRef, Node};

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Returns true for elements that never have content.
pub(crate) fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Serializes an element and its subtree.
pub fn outer_xhtml(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    write_element(element, &mut out);
    out
}

/// Serializes the children of an element, without the element itself.
pub fn inner_xhtml(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    write_children(element, &mut out);
    out
}

/// Escapes text for use as element content.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(text, false, &mut out);
    out
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let value = element.value();
    let name = value.name();

    out.push('<');
    out.push_str(name);
    for (attr, attr_value) in value.attrs().filter(|(attr, _)| is_xml_attribute_name(attr)) {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        push_escaped(attr_value, true, out);
        out.push('"');
    }

    if is_void_element(name) && !element.has_children() {
        out.push_str(" />");
        return;
    }

    out.push('>');
    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_escaped(text, false, out),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, out);
                }
            }
            // Comments, doctypes and processing instructions are dropped
            _ => {}
        }
    }
}

/// Attribute names that survive XML parsing without a namespace declaration.
///
/// Framework attributes such as `@click`, `:class` or `x-on:click` are not
/// valid here; only the predeclared `xml:` and `xmlns:` prefixes are kept.
fn is_xml_attribute_name(name: &str) -> bool {
    let local = match name.split_once(':') {
        None => name,
        Some(("xml" | "xmlns", local)) if !local.contains(':') => local,
        Some(_) => return false,
    };

    let mut chars = local.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn push_escaped(text: &str, in_attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
