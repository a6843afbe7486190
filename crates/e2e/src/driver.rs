//! Browser actions beyond what waiters need

use molview_waiters::{Handle, Locator};
use serde_json::Value;

use crate::error::E2eResult;

/// A scriptable browser session.
///
/// [`Handle`] covers what predicates read; this adds what scenarios and the
/// report scraper do. Implemented by [`Session`](crate::webdriver::Session)
/// and by in-memory fakes in tests.
pub trait Driver: Handle {
    fn navigate(&self, url: &str) -> E2eResult<()>;

    fn find_all(&self, locator: &Locator) -> E2eResult<Vec<Self::Element>>;

    fn find_within(&self, parent: &Self::Element, locator: &Locator) -> E2eResult<Self::Element>;

    fn find_all_within(
        &self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> E2eResult<Vec<Self::Element>>;

    /// Rendered text of the element
    fn text(&self, element: &Self::Element) -> E2eResult<String>;

    /// Live DOM property, e.g. the current `value` of an input
    fn property(&self, element: &Self::Element, name: &str) -> E2eResult<Value>;

    fn click(&self, element: &Self::Element) -> E2eResult<()>;

    fn send_keys(&self, element: &Self::Element, text: &str) -> E2eResult<()>;

    /// End the session. Further calls may fail.
    fn close(&self) -> E2eResult<()> {
        Ok(())
    }
}
