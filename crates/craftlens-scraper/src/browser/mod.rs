//! Rendering seam: a shared headless browser that hands out isolated
//! browsing contexts.
//!
//! The traits abstract over the engine so the pipelines can be driven by a
//! scripted fake in tests; [`chromium`] is the production implementation.

pub mod chromium;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use craftlens_core::{AppConfig, Viewport};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::error::ScraperError;

/// URL patterns blocked in every context: static assets the extractors never
/// need, plus third-party trackers.
pub const DEFAULT_BLOCKED_RESOURCES: &[&str] = &[
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.gif",
    "*.svg",
    "*.ico",
    "*.woff",
    "*.woff2",
    "*google-analytics.com*",
    "*googletagmanager.com*",
    "*facebook.com*",
];

/// Identity and environment applied to every new browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextProfile {
    pub stealth: bool,
    pub user_agent: String,
    pub locale: String,
    pub timezone: String,
    pub viewport: Viewport,
    pub blocked_resources: Vec<String>,
}

impl ContextProfile {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            stealth: config.stealth,
            user_agent: config.user_agent.clone(),
            locale: config.locale.clone(),
            timezone: config.timezone.clone(),
            viewport: config.viewport,
            blocked_resources: DEFAULT_BLOCKED_RESOURCES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        }
    }
}

/// Starts a browser process.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, ScraperError>;
}

/// A running browser. Shared by every request for the life of the process.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Opens a fresh context with its own cookies, storage and identity.
    async fn create_context(
        &self,
        profile: &ContextProfile,
    ) -> Result<Box<dyn BrowsingContext>, ScraperError>;

    /// Terminates the browser. Calling it more than once is a no-op.
    async fn close(&self) -> Result<(), ScraperError>;
}

/// One isolated page inside a [`BrowserSession`].
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    /// Aborts requests whose URL matches any of the wildcard patterns.
    async fn block_resources(&mut self, patterns: &[String]) -> Result<(), ScraperError>;

    /// Loads `url` and returns the document HTML once the load event fired.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<String, ScraperError>;

    /// Evaluates a script in the page and returns its JSON result.
    async fn evaluate(&self, script: &str, timeout: Duration) -> Result<Value, ScraperError>;

    async fn close(self: Box<Self>) -> Result<(), ScraperError>;
}

/// Owns the process-wide browser.
///
/// The browser is launched on the first [`acquire`](Self::acquire); callers
/// arriving during the launch wait for it. After [`shutdown`](Self::shutdown)
/// every `acquire` fails with [`ScraperError::SessionClosed`].
pub struct BrowserSessions {
    launcher: Arc<dyn BrowserLauncher>,
    profile: ContextProfile,
    session: OnceCell<Arc<dyn BrowserSession>>,
    closed: AtomicBool,
}

impl BrowserSessions {
    #[must_use]
    pub fn new(launcher: Arc<dyn BrowserLauncher>, profile: ContextProfile) -> Self {
        Self {
            launcher,
            profile,
            session: OnceCell::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// `true` once a browser has been launched.
    #[must_use]
    pub fn is_launched(&self) -> bool {
        self.session.initialized()
    }

    /// Leases a new isolated browsing context, launching the browser first if
    /// needed.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::SessionClosed`] after [`shutdown`](Self::shutdown).
    /// - Whatever the launcher or session reports when the browser cannot be
    ///   started or the context cannot be created.
    pub async fn acquire(&self) -> Result<ContextLease, ScraperError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ScraperError::SessionClosed);
        }

        let session = self
            .session
            .get_or_try_init(|| async {
                tracing::info!("launching browser");
                self.launcher.launch().await
            })
            .await?
            .clone();

        // shutdown() may have run while the launch was in flight
        if self.closed.load(Ordering::SeqCst) {
            if let Err(e) = session.close().await {
                tracing::warn!(error = %e, "failed to close browser launched during shutdown");
            }
            return Err(ScraperError::SessionClosed);
        }

        let mut context = session.create_context(&self.profile).await?;
        if !self.profile.blocked_resources.is_empty() {
            if let Err(e) = context.block_resources(&self.profile.blocked_resources).await {
                tracing::warn!(error = %e, "resource blocking unavailable; continuing unblocked");
            }
        }

        Ok(ContextLease {
            context: Some(context),
        })
    }

    /// Closes the browser. Idempotent; only the first call does any work.
    ///
    /// # Errors
    ///
    /// Returns the session's error if the browser fails to close.
    pub async fn shutdown(&self) -> Result<(), ScraperError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        match self.session.get() {
            Some(session) => {
                tracing::info!("shutting down browser");
                session.close().await
            }
            None => Ok(()),
        }
    }
}

/// A browsing context on loan to one request.
///
/// Call [`release`](Self::release) when done. A lease dropped without release
/// closes its context from a spawned task.
pub struct ContextLease {
    context: Option<Box<dyn BrowsingContext>>,
}

impl ContextLease {
    fn context_mut(&mut self) -> Result<&mut Box<dyn BrowsingContext>, ScraperError> {
        self.context
            .as_mut()
            .ok_or_else(|| ScraperError::Browser("context already released".to_owned()))
    }

    /// # Errors
    ///
    /// Propagates the context's navigation error.
    pub async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<String, ScraperError> {
        self.context_mut()?.navigate(url, timeout).await
    }

    /// # Errors
    ///
    /// Propagates the context's evaluation error.
    pub async fn evaluate(&mut self, script: &str, timeout: Duration) -> Result<Value, ScraperError> {
        self.context_mut()?.evaluate(script, timeout).await
    }

    /// Closes the context. Close failures are logged, not returned.
    pub async fn release(mut self) {
        if let Some(context) = self.context.take() {
            if let Err(e) = context.close().await {
                tracing::warn!(error = %e, "failed to close browsing context");
            }
        }
    }
}

impl Drop for ContextLease {
    fn drop(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = context.close().await {
                        tracing::warn!(error = %e, "failed to close abandoned browsing context");
                    }
                });
            }
            Err(_) => {
                tracing::warn!("browsing context dropped outside a runtime; left open");
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
