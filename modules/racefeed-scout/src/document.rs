//! Typed document tree over `scraper`.
//!
//! Extraction code only needs three things from a parsed page: find elements
//! by CSS selector, read an attribute, and read the text. `Document` and
//! `Node` expose exactly that.
//!
//! A parsed `Document` is not `Send`. Parse and extract inside a plain
//! function and only hand owned results back to async code.

use scraper::{ElementRef, Html, Selector};

/// Compile a selector literal. Only used for constants known to be valid.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn find_all(&self, selector: &Selector) -> Vec<Node<'_>> {
        self.html.select(selector).map(Node::new).collect()
    }

    pub fn find_first(&self, selector: &Selector) -> Option<Node<'_>> {
        self.html.select(selector).next().map(Node::new)
    }
}

#[derive(Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl<'a> Node<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Attribute value, treating a present-but-empty attribute as absent.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.element
            .value()
            .attr(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Text content, trimmed.
    pub fn text(&self) -> String {
        self.element.text().collect::<String>().trim().to_string()
    }

    /// Descendants matching `selector`, in document order.
    pub fn find_all(&self, selector: &Selector) -> Vec<Node<'a>> {
        self.element.select(selector).map(Node::new).collect()
    }

    pub fn find_first(&self, selector: &Selector) -> Option<Node<'a>> {
        self.element.select(selector).next().map(Node::new)
    }
}

/// Rewrite a protocol-relative URL (`//host/...`) to `https:`.
pub fn with_https_scheme(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}
