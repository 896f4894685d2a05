//! Page capability abstraction
//!
//! The crawl drivers never touch HTTP or HTML directly; they speak to a
//! page session through this narrow interface: navigate somewhere, wait for
//! elements, read text and attributes, click a control. The shipped backend
//! is HTTP-based (`HttpPage`); a headless-browser backend would implement
//! the same trait.

mod http;

pub use http::HttpPage;

use crate::PageError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// A snapshot of one matched element
///
/// Handles carry their text and attributes by value so that backends do not
/// have to keep live DOM references alive across awaits. A handle stays
/// valid after further navigation; it just describes what was on the page
/// when it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// The selector that produced this handle (for diagnostics and re-query)
    pub selector: String,

    /// Concatenated text content, trimmed
    pub text: String,

    /// Attribute name to value
    pub attributes: HashMap<String, String>,
}

impl ElementHandle {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// One owned page session
///
/// Reference behavior is a single session used strictly sequentially, which
/// is why the methods take `&self`: backends keep their small mutable state
/// behind interior mutability and stay shareable with extractors.
#[async_trait]
pub trait PageCapability: Send + Sync {
    /// Navigates the session to `url`
    async fn navigate(&self, url: &str) -> std::result::Result<(), PageError>;

    /// Waits for the first element matching `selector`
    ///
    /// Absence within the timeout is not an error; it comes back as `None`
    /// and callers substitute their empty default.
    async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> std::result::Result<Option<ElementHandle>, PageError>;

    /// Waits for all elements matching `selector` (possibly none)
    async fn wait_for_all(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> std::result::Result<Vec<ElementHandle>, PageError>;

    /// Activates a control, e.g. follows a pagination link
    async fn click(&self, handle: &ElementHandle) -> std::result::Result<(), PageError>;

    /// The effective URL of the current page
    fn current_url(&self) -> String;

    /// Reads the text content of a handle
    fn read_text(&self, handle: &ElementHandle) -> String {
        handle.text.clone()
    }

    /// Reads an attribute of a handle, if present
    fn read_attribute(&self, handle: &ElementHandle, name: &str) -> Option<String> {
        handle.attribute(name).map(str::to_string)
    }
}
