use std::sync::Mutex;

use {async_trait::async_trait, url::Url};

use crate::Result;

/// Addressable location of the view and the way out to the provider.
pub trait Navigator: Send + Sync {
    /// Location the view was reached at, including any return parameters.
    fn current(&self) -> Url;

    /// Rewrite the location in place without navigating.
    fn replace(&self, url: Url);

    /// Hand control to an external page (the provider's authorization
    /// screen). Nothing else changes locally until the callback is observed.
    fn redirect(&self, url: &Url) -> Result<()>;
}

/// Explicit confirmation step for destructive operations.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything; for non-interactive callers that already asked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Navigator that only records what happens to it.
#[derive(Debug)]
pub struct MemoryNavigator {
    location: Mutex<Url>,
    redirects: Mutex<Vec<Url>>,
}

impl MemoryNavigator {
    pub fn new(location: Url) -> Self {
        Self {
            location: Mutex::new(location),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn redirects(&self) -> Vec<Url> {
        self.redirects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Navigator for MemoryNavigator {
    fn current(&self) -> Url {
        self.location
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn replace(&self, url: Url) {
        *self.location.lock().unwrap_or_else(|e| e.into_inner()) = url;
    }

    fn redirect(&self, url: &Url) -> Result<()> {
        self.redirects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.clone());
        Ok(())
    }
}
