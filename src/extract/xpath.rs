//! XPath string expressions for entry dates
//!
//! A date selector written as `xpathstr=<expr>` is an XPath 1.0 expression
//! evaluated as a string with the entry element as the context node, e.g.
//! `xpathstr=substring-after(.//p, 'Posted on ')`. The result is parsed
//! with the feed's date format.

use super::dates::{normalize_date, DateSource};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::Package;
use sxd_xpath::{Context, Factory, XPath};

/// Prefix marking a date selector as an XPath string expression
pub const XPATH_STRING_PREFIX: &str = "xpathstr=";

/// Returns the expression of an `xpathstr=` selector
pub fn xpath_expression(selector: &str) -> Option<&str> {
    selector
        .trim_start()
        .strip_prefix(XPATH_STRING_PREFIX)
        .map(str::trim)
}

/// Compiles an XPath expression
pub fn compile_xpath(expression: &str) -> Result<XPath, String> {
    Factory::new()
        .build(expression)
        .map_err(|e| format!("{:?}", e))?
        .ok_or_else(|| "empty XPath expression".to_string())
}

/// A rendered page converted for XPath evaluation
pub struct XPathDocument {
    package: Package,
}

impl XPathDocument {
    pub fn parse(document: &Html) -> Self {
        Self {
            package: sxd_html::parse_html(&document.html()),
        }
    }

    /// Evaluates `xpath` as a string with `entry` as the context node
    ///
    /// `entry` must come from the page this document was parsed from.
    pub fn evaluate_string(&self, xpath: &XPath, entry: ElementRef<'_>) -> Option<String> {
        let document = self.package.as_document();
        let context_node = find_element(&document.root().children(), &element_path(entry))?;

        match xpath.evaluate(&Context::new(), context_node) {
            Ok(value) => Some(value.string()),
            Err(e) => {
                tracing::debug!("XPath evaluation failed: {:?}", e);
                None
            }
        }
    }
}

/// Position of `entry` as element-child indices from the document root
fn element_path(entry: ElementRef<'_>) -> Vec<usize> {
    let node = *entry;
    let mut path: Vec<usize> = std::iter::once(node)
        .chain(node.ancestors())
        .filter(|node| node.value().is_element())
        .map(|node| {
            node.prev_siblings()
                .filter(|sibling| sibling.value().is_element())
                .count()
        })
        .collect();
    path.reverse();
    path
}

fn find_element<'d>(root_children: &[ChildOfRoot<'d>], path: &[usize]) -> Option<Element<'d>> {
    let mut elements: Vec<Element<'d>> = root_children
        .iter()
        .filter_map(|child| match child {
            ChildOfRoot::Element(element) => Some(element.clone()),
            _ => None,
        })
        .collect();

    let mut found = None;
    for &index in path {
        let element = elements.get(index)?.clone();
        elements = element
            .children()
            .into_iter()
            .filter_map(|child| match child {
                ChildOfElement::Element(element) => Some(element),
                _ => None,
            })
            .collect();
        found = Some(element);
    }
    found
}

/// Extracts an entry date with an XPath string expression
///
/// The string is parsed with `format`; without a format, or when the
/// expression yields nothing, the date is `now`.
pub fn extract_xpath_date(
    fragment: ElementRef<'_>,
    document: &XPathDocument,
    xpath: &XPath,
    format: Option<&str>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let Some(format) = format else {
        return now;
    };

    match document.evaluate_string(xpath, fragment) {
        Some(text) if !text.trim().is_empty() => {
            normalize_date(DateSource::Text { text: &text, format }, now)
        }
        _ => now,
    }
}
