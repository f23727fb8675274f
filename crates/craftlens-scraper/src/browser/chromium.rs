//! Headless Chromium over the DevTools protocol, via `chromiumoxide`.
//!
//! Each browsing context is a CDP browser context (its own cookie jar and
//! storage) holding a single page.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, SetBlockedUrLsParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use craftlens_core::AppConfig;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::{BrowserLauncher, BrowserSession, BrowsingContext, ContextProfile};
use crate::error::ScraperError;

fn cdp_error(e: CdpError) -> ScraperError {
    ScraperError::Browser(e.to_string())
}

fn duration_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Launches a local Chromium.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
    window: (u32, u32),
    request_timeout: Duration,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            executable: config.chromium_path.clone(),
            window: (config.viewport.width, config.viewport.height),
            request_timeout: Duration::from_secs(config.navigation_timeout_secs),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.window.0, self.window.1)
            .request_timeout(self.request_timeout)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled");
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(ScraperError::Browser)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, ScraperError> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_error)?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "chromium handler event error");
                }
            }
        });

        tracing::info!(executable = ?self.executable, "chromium launched");
        Ok(Arc::new(ChromiumSession {
            browser: Arc::new(RwLock::new(Some(browser))),
            handler_task: Mutex::new(Some(handler_task)),
        }))
    }
}

/// A running Chromium process. `None` once closed.
pub struct ChromiumSession {
    browser: Arc<RwLock<Option<Browser>>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn create_context(
        &self,
        profile: &ContextProfile,
    ) -> Result<Box<dyn BrowsingContext>, ScraperError> {
        let guard = self.browser.read().await;
        let browser = guard.as_ref().ok_or(ScraperError::SessionClosed)?;

        let created = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(cdp_error)?;
        let context_id = created.result.browser_context_id.clone();

        let opened = match CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
        {
            Ok(target) => browser.new_page(target).await.map_err(cdp_error),
            Err(e) => Err(ScraperError::Browser(e)),
        };
        let page = cleanup_on_error(opened, dispose_context(browser, context_id.clone())).await?;
        drop(guard);

        let context = ChromiumContext {
            page: Some(page),
            context_id,
            browser: Arc::clone(&self.browser),
        };
        if let Err(e) = context.apply_profile(profile).await {
            if let Err(close_err) = Box::new(context).close().await {
                tracing::debug!(error = %close_err, "closing half-configured context failed");
            }
            return Err(e);
        }
        Ok(Box::new(context))
    }

    async fn close(&self) -> Result<(), ScraperError> {
        let Some(mut browser) = self.browser.write().await.take() else {
            return Ok(());
        };
        let closed = browser.close().await.map_err(cdp_error);
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "waiting for chromium exit failed");
        }
        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        closed.map(|_| ())
    }
}

/// Passes `result` through, awaiting `cleanup` first when it is an error.
/// `cleanup` is never polled on success.
async fn cleanup_on_error<T>(
    result: Result<T, ScraperError>,
    cleanup: impl Future<Output = ()>,
) -> Result<T, ScraperError> {
    if result.is_err() {
        cleanup.await;
    }
    result
}

async fn dispose_context(browser: &Browser, context_id: BrowserContextId) {
    if let Err(e) = browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        tracing::debug!(error = %e, "disposing browser context failed");
    }
}

/// One page in its own CDP browser context.
pub struct ChromiumContext {
    page: Option<Page>,
    context_id: BrowserContextId,
    browser: Arc<RwLock<Option<Browser>>>,
}

impl ChromiumContext {
    fn page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::Browser("page already closed".to_owned()))
    }

    async fn apply_profile(&self, profile: &ContextProfile) -> Result<(), ScraperError> {
        let page = self.page()?;

        if profile.stealth {
            page.enable_stealth_mode_with_agent(&profile.user_agent)
                .await
                .map_err(cdp_error)?;
        } else {
            page.execute(SetUserAgentOverrideParams::new(profile.user_agent.clone()))
                .await
                .map_err(cdp_error)?;
        }

        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(profile.viewport.width),
            i64::from(profile.viewport.height),
            1.0,
            false,
        ))
        .await
        .map_err(cdp_error)?;

        page.execute(SetLocaleOverrideParams {
            locale: Some(profile.locale.clone()),
        })
        .await
        .map_err(cdp_error)?;

        page.execute(SetTimezoneOverrideParams::new(profile.timezone.clone()))
            .await
            .map_err(cdp_error)?;

        Ok(())
    }
}

#[async_trait]
impl BrowsingContext for ChromiumContext {
    async fn block_resources(&mut self, patterns: &[String]) -> Result<(), ScraperError> {
        let page = self.page()?;
        page.execute(NetworkEnableParams::default())
            .await
            .map_err(cdp_error)?;
        page.execute(SetBlockedUrLsParams::new(patterns.to_vec()))
            .await
            .map_err(cdp_error)?;
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<String, ScraperError> {
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(ScraperError::Navigation {
                    url: url.to_owned(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ScraperError::Timeout {
                    operation: format!("navigation to {url}"),
                    timeout_ms: duration_ms(timeout),
                })
            }
        }
        page.content().await.map_err(cdp_error)
    }

    async fn evaluate(&self, script: &str, timeout: Duration) -> Result<Value, ScraperError> {
        let page = self.page()?;
        let result = tokio::time::timeout(timeout, page.evaluate(script))
            .await
            .map_err(|_| ScraperError::Timeout {
                operation: "script evaluation".to_owned(),
                timeout_ms: duration_ms(timeout),
            })?
            .map_err(cdp_error)?;
        result
            .into_value::<Value>()
            .map_err(|e| ScraperError::Browser(format!("script result is not JSON: {e}")))
    }

    async fn close(mut self: Box<Self>) -> Result<(), ScraperError> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "page close failed");
            }
        }
        let guard = self.browser.read().await;
        if let Some(browser) = guard.as_ref() {
            browser
                .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
                .await
                .map_err(cdp_error)?;
        }
        Ok(())
    }
}
