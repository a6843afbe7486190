//! Element locators

use std::fmt;

use serde::{Deserialize, Serialize};

/// How to find an element in the document.
///
/// Serialized externally tagged so scenario files read naturally:
/// `{ id: clip-button }` or `{ class_name: spinner-grow }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Id(String),
    ClassName(String),
    TagName(String),
    Css(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn class_name(class: impl Into<String>) -> Self {
        Locator::ClassName(class.into())
    }

    pub fn tag_name(tag: impl Into<String>) -> Self {
        Locator::TagName(tag.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// Translate into a CSS selector.
    ///
    /// Ids become attribute selectors so ids that are not valid CSS
    /// identifiers (leading digits, dots) still match.
    pub fn to_css(&self) -> String {
        match self {
            Locator::Id(id) => format!("[id=\"{}\"]", escape_quotes(id)),
            Locator::ClassName(class) => format!(".{}", class),
            Locator::TagName(tag) => tag.clone(),
            Locator::Css(selector) => selector.clone(),
        }
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={}", id),
            Locator::ClassName(class) => write!(f, "class={}", class),
            Locator::TagName(tag) => write!(f, "tag={}", tag),
            Locator::Css(selector) => write!(f, "css={}", selector),
        }
    }
}
