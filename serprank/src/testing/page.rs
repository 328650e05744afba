//! A static-HTML implementation of the page accessor.

use async_trait::async_trait;
use parking_lot::RwLock;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use crate::accessor::{ElementFacts, ElementHandle, PageAccessor};
use crate::errors::RankError;

/// How a handle re-resolves against the current document.
///
/// Handles are addressed by (selector, index, ancestor hops) rather than
/// node identity, so the accessor stays free of parsed-DOM state and can
/// re-parse on every call.
#[derive(Debug, Clone)]
struct HandleSpec {
    generation: u64,
    selector: String,
    index: usize,
    ancestor_hops: usize,
}

#[derive(Debug, Default)]
struct PageState {
    current: usize,
    generation: u64,
    navigations: usize,
    handles: Vec<HandleSpec>,
}

/// A deterministic [`PageAccessor`] over a fixed sequence of HTML pages.
///
/// `navigate` lands on the first page; each successful `click_and_wait`
/// advances to the next one. Handles from earlier page states go stale and
/// resolve to empty values, mirroring a real DOM after navigation.
#[derive(Debug)]
pub struct StaticPage {
    pages: Vec<String>,
    state: RwLock<PageState>,
}

impl StaticPage {
    /// Creates an accessor over a sequence of result pages.
    #[must_use]
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            state: RwLock::new(PageState::default()),
        }
    }

    /// Creates an accessor over a single page.
    #[must_use]
    pub fn single(html: String) -> Self {
        Self::new(vec![html])
    }

    /// How many times `navigate` was called.
    #[must_use]
    pub fn navigations(&self) -> usize {
        self.state.read().navigations
    }

    /// The 0-based index of the page currently shown.
    #[must_use]
    pub fn current_page_index(&self) -> usize {
        self.state.read().current
    }

    fn current_html(&self) -> &str {
        let current = self.state.read().current;
        self.pages.get(current).map_or("", String::as_str)
    }

    fn register(&self, spec: HandleSpec) -> ElementHandle {
        let mut state = self.state.write();
        state.handles.push(spec);
        ElementHandle::new(state.handles.len() as u64 - 1)
    }

    fn spec_of(&self, handle: ElementHandle) -> Option<HandleSpec> {
        let state = self.state.read();
        let spec = state.handles.get(usize::try_from(handle.id()).ok()?)?;
        if spec.generation != state.generation {
            return None;
        }
        Some(spec.clone())
    }

    /// Runs `f` over the element a handle resolves to on the current page.
    fn with_element<T>(&self, handle: ElementHandle, f: impl FnOnce(ElementRef<'_>) -> T) -> Option<T> {
        let spec = self.spec_of(handle)?;
        let doc = Html::parse_document(self.current_html());
        let selector = Selector::parse(&spec.selector).ok()?;
        let base = doc.select(&selector).nth(spec.index)?;
        let element = ascend(base, spec.ancestor_hops)?;
        Some(f(element))
    }
}

/// Walks up `hops` element ancestors.
fn ascend(mut element: ElementRef<'_>, hops: usize) -> Option<ElementRef<'_>> {
    for _ in 0..hops {
        element = element.ancestors().find_map(ElementRef::wrap)?;
    }
    Some(element)
}

fn facts_of(element: ElementRef<'_>) -> ElementFacts {
    ElementFacts {
        tag: element.value().name().to_lowercase(),
        id: element.value().id().unwrap_or_default().to_string(),
        classes: element.value().classes().map(String::from).collect(),
    }
}

#[async_trait]
impl PageAccessor for StaticPage {
    async fn navigate(&mut self, _url: &str) -> Result<(), RankError> {
        let mut state = self.state.write();
        state.current = 0;
        state.generation += 1;
        state.navigations += 1;
        Ok(())
    }

    fn query_all(&self, selector: &str) -> Vec<ElementHandle> {
        let Ok(parsed) = Selector::parse(selector) else {
            return Vec::new();
        };

        let doc = Html::parse_document(self.current_html());
        let count = doc.select(&parsed).count();
        let generation = self.state.read().generation;

        (0..count)
            .map(|index| {
                self.register(HandleSpec {
                    generation,
                    selector: selector.to_string(),
                    index,
                    ancestor_hops: 0,
                })
            })
            .collect()
    }

    fn attribute(&self, handle: ElementHandle, name: &str) -> String {
        self.with_element(handle, |el| {
            el.value().attr(name).unwrap_or_default().to_string()
        })
        .unwrap_or_default()
    }

    fn text(&self, handle: ElementHandle) -> String {
        self.with_element(handle, |el| el.text().collect::<String>())
            .unwrap_or_default()
    }

    fn nearest_ancestor_matching(
        &self,
        handle: ElementHandle,
        predicate: &dyn Fn(&ElementFacts) -> bool,
    ) -> Option<ElementHandle> {
        let spec = self.spec_of(handle)?;
        let extra_hops = self.with_element(handle, |mut el| {
            let mut hops = 0usize;
            loop {
                let Some(parent) = el.ancestors().find_map(ElementRef::wrap) else {
                    return None;
                };
                hops += 1;
                if predicate(&facts_of(parent)) {
                    return Some(hops);
                }
                el = parent;
            }
        })??;

        Some(self.register(HandleSpec {
            generation: spec.generation,
            selector: spec.selector,
            index: spec.index,
            ancestor_hops: spec.ancestor_hops + extra_hops,
        }))
    }

    fn container_markup(&self, handle: ElementHandle) -> String {
        self.with_element(handle, |el| el.html()).unwrap_or_default()
    }

    async fn wait_for_any(&self, selectors: &[String], _timeout: Duration) -> bool {
        let doc = Html::parse_document(self.current_html());
        selectors.iter().any(|selector| {
            Selector::parse(selector)
                .map(|parsed| doc.select(&parsed).next().is_some())
                .unwrap_or(false)
        })
    }

    async fn click_and_wait(&mut self, handle: ElementHandle, _timeout: Duration) -> bool {
        if self.with_element(handle, |_| ()).is_none() {
            return false;
        }

        let mut state = self.state.write();
        if state.current + 1 >= self.pages.len() {
            return false;
        }
        state.current += 1;
        state.generation += 1;
        true
    }

    fn page_source_contains(&self, needle: &str) -> bool {
        self.current_html()
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }
}
