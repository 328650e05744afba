//! Protocol traits for the rendered-page boundary.
//!
//! These traits define the interface the crawl pipeline consumes from the
//! browser-automation collaborator, allowing for pluggable implementations.
//! The crate ships a static-HTML implementation behind the `fixtures`
//! feature for tests and offline runs.

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::RankError;

/// An opaque reference to an element on the rendered page.
///
/// Handles are only meaningful to the accessor that produced them and only
/// for the page state they were produced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(u64);

impl ElementHandle {
    /// Creates a handle from a raw accessor-assigned id.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw accessor-assigned id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Structural facts about an element, used for ancestor predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementFacts {
    /// Lowercase tag name.
    pub tag: String,
    /// The `id` attribute, empty when absent.
    pub id: String,
    /// The element's class list.
    pub classes: Vec<String>,
}

impl ElementFacts {
    /// Whether the element carries any of the given classes.
    #[must_use]
    pub fn has_any_class(&self, classes: &[String]) -> bool {
        self.classes.iter().any(|c| classes.iter().any(|want| want == c))
    }

    /// Whether the element id contains any of the given fragments.
    #[must_use]
    pub fn id_contains_any(&self, fragments: &[String]) -> bool {
        !self.id.is_empty() && fragments.iter().any(|f| self.id.contains(f.as_str()))
    }
}

/// Protocol for reading and driving one rendered results page.
///
/// Query operations are synchronous and never fail - an element that cannot
/// be resolved yields an empty value. The only suspension points are
/// [`PageAccessor::wait_for_any`] and [`PageAccessor::click_and_wait`], both
/// bounded by explicit timeouts.
#[async_trait]
pub trait PageAccessor: Send {
    /// Navigates the page to a URL.
    async fn navigate(&mut self, url: &str) -> Result<(), RankError>;

    /// Returns all elements matching a CSS selector, in document order.
    fn query_all(&self, selector: &str) -> Vec<ElementHandle>;

    /// Returns an attribute value, or empty when absent or unresolvable.
    fn attribute(&self, handle: ElementHandle, name: &str) -> String;

    /// Returns the element's visible text, or empty when unresolvable.
    fn text(&self, handle: ElementHandle) -> String;

    /// Walks ancestors from the element, returning the nearest one whose
    /// facts satisfy the predicate.
    fn nearest_ancestor_matching(
        &self,
        handle: ElementHandle,
        predicate: &dyn Fn(&ElementFacts) -> bool,
    ) -> Option<ElementHandle>;

    /// Returns the serialized markup of the element's subtree, or empty
    /// when unresolvable.
    fn container_markup(&self, handle: ElementHandle) -> String;

    /// Waits until any of the selectors matches, bounded by the timeout.
    ///
    /// Returns `false` on timeout.
    async fn wait_for_any(&self, selectors: &[String], timeout: Duration) -> bool;

    /// Clicks an element and waits for the resulting page update, bounded
    /// by the timeout.
    ///
    /// Returns `false` when the element could not be clicked or the update
    /// never happened.
    async fn click_and_wait(&mut self, handle: ElementHandle, timeout: Duration) -> bool;

    /// Whether the current page source contains a substring.
    ///
    /// Used as the block/challenge detection signal.
    fn page_source_contains(&self, needle: &str) -> bool;
}

/// Protocol for acquiring page-rendering resources.
///
/// Each crawl attempt acquires exactly one fresh page; the retry controller
/// never resumes a prior attempt's page.
#[async_trait]
pub trait PageProvider: Send + Sync {
    /// Acquires a fresh page for one crawl attempt.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::ResourceSetup`] when no page can be provided;
    /// the failure consumes one retry.
    async fn acquire(&self) -> Result<Box<dyn PageAccessor>, RankError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_facts_class_lookup() {
        let facts = ElementFacts {
            tag: "div".into(),
            id: String::new(),
            classes: vec!["g".into(), "result".into()],
        };
        assert!(facts.has_any_class(&["g".into(), "tF2Cxc".into()]));
        assert!(!facts.has_any_class(&["MjjYud".into()]));
    }

    #[test]
    fn test_element_facts_id_fragments() {
        let facts = ElementFacts {
            tag: "div".into(),
            id: "center_col".into(),
            classes: vec![],
        };
        assert!(facts.id_contains_any(&["center_col".into()]));
        assert!(facts.id_contains_any(&["col".into()]));
        assert!(!facts.id_contains_any(&["rso".into()]));

        let anonymous = ElementFacts::default();
        assert!(!anonymous.id_contains_any(&["search".into()]));
    }

    #[test]
    fn test_handle_roundtrip() {
        let handle = ElementHandle::new(42);
        assert_eq!(handle.id(), 42);
        assert_eq!(handle, ElementHandle::new(42));
    }
}
