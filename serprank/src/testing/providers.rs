//! Page providers for scripting multi-attempt scenarios.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::accessor::{PageAccessor, PageProvider};
use crate::errors::RankError;

use super::page::StaticPage;

/// Serves a fresh [`StaticPage`] over the same fixture pages on every
/// acquisition.
#[derive(Debug)]
pub struct FixturePageProvider {
    pages: Vec<String>,
    acquisitions: AtomicUsize,
}

impl FixturePageProvider {
    /// Creates a provider over a fixed page sequence.
    #[must_use]
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            acquisitions: AtomicUsize::new(0),
        }
    }

    /// Creates a provider over a single page.
    #[must_use]
    pub fn single(html: String) -> Self {
        Self::new(vec![html])
    }

    /// How many pages were acquired.
    #[must_use]
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageProvider for FixturePageProvider {
    async fn acquire(&self) -> Result<Box<dyn PageAccessor>, RankError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticPage::new(self.pages.clone())))
    }
}

/// Serves a scripted sequence of pages and setup failures, one entry per
/// acquisition, in order.
#[derive(Debug, Default)]
pub struct ScriptedPageProvider {
    script: Mutex<VecDeque<Result<StaticPage, RankError>>>,
    acquisitions: AtomicUsize,
}

impl ScriptedPageProvider {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a page acquisition to the script.
    #[must_use]
    pub fn then_page(self, page: StaticPage) -> Self {
        self.script.lock().push_back(Ok(page));
        self
    }

    /// Appends a setup failure to the script.
    #[must_use]
    pub fn then_error(self, error: RankError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// How many acquisitions were attempted.
    #[must_use]
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageProvider for ScriptedPageProvider {
    async fn acquire(&self) -> Result<Box<dyn PageAccessor>, RankError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().pop_front() {
            Some(Ok(page)) => Ok(Box::new(page)),
            Some(Err(error)) => Err(error),
            None => Err(RankError::ResourceSetup(
                "scripted provider ran out of entries".to_string(),
            )),
        }
    }
}
