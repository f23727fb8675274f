//! Scripted browser for pipeline tests: serves fixed HTML per URL fragment
//! and counts launches and context lifecycles.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use craftlens_core::Viewport;
use craftlens_scraper::{
    BrowserLauncher, BrowserSession, BrowserSessions, BrowsingContext, ContextProfile,
    RenderTimings, ScraperError,
};
use serde_json::Value;

#[derive(Default)]
pub struct FakeState {
    pub launches: AtomicUsize,
    pub contexts_opened: AtomicUsize,
    pub contexts_closed: AtomicUsize,
    pub navigations: AtomicUsize,
}

impl FakeState {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn contexts_opened(&self) -> usize {
        self.contexts_opened.load(Ordering::SeqCst)
    }

    pub fn contexts_closed(&self) -> usize {
        self.contexts_closed.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }
}

/// Serves `html` for any URL containing `fragment`; unknown URLs fail to
/// navigate. A launcher built with `failing()` never starts.
pub struct FakeLauncher {
    pages: Arc<Vec<(String, String)>>,
    state: Arc<FakeState>,
    fail_launch: bool,
}

impl FakeLauncher {
    pub fn serving(pages: Vec<(&str, String)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(fragment, html)| (fragment.to_owned(), html))
                    .collect(),
            ),
            state: Arc::new(FakeState::default()),
            fail_launch: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::serving(Vec::new())
        }
    }

    pub fn state(&self) -> Arc<FakeState> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserSession>, ScraperError> {
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail_launch {
            return Err(ScraperError::Browser("chromium executable not found".to_owned()));
        }
        Ok(Arc::new(FakeSession {
            pages: Arc::clone(&self.pages),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeSession {
    pages: Arc<Vec<(String, String)>>,
    state: Arc<FakeState>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn create_context(
        &self,
        _profile: &ContextProfile,
    ) -> Result<Box<dyn BrowsingContext>, ScraperError> {
        self.state.contexts_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeContext {
            pages: Arc::clone(&self.pages),
            state: Arc::clone(&self.state),
            current: None,
        }))
    }

    async fn close(&self) -> Result<(), ScraperError> {
        Ok(())
    }
}

struct FakeContext {
    pages: Arc<Vec<(String, String)>>,
    state: Arc<FakeState>,
    current: Option<String>,
}

#[async_trait]
impl BrowsingContext for FakeContext {
    async fn block_resources(&mut self, _patterns: &[String]) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<String, ScraperError> {
        self.state.navigations.fetch_add(1, Ordering::SeqCst);
        let html = self
            .pages
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, html)| html.clone())
            .ok_or_else(|| ScraperError::Navigation {
                url: url.to_owned(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_owned(),
            })?;
        self.current = Some(html.clone());
        Ok(html)
    }

    async fn evaluate(&self, _script: &str, _timeout: Duration) -> Result<Value, ScraperError> {
        Ok(self.current.clone().map_or(Value::Null, Value::String))
    }

    async fn close(self: Box<Self>) -> Result<(), ScraperError> {
        self.state.contexts_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn test_profile() -> ContextProfile {
    ContextProfile {
        stealth: false,
        user_agent: "craftlens-test/0.1".to_owned(),
        locale: "ko-KR".to_owned(),
        timezone: "Asia/Seoul".to_owned(),
        viewport: Viewport {
            width: 1280,
            height: 800,
        },
        blocked_resources: Vec::new(),
    }
}

pub fn test_timings() -> RenderTimings {
    RenderTimings {
        navigation: Duration::from_secs(2),
        script: Duration::from_secs(2),
        settle: Duration::ZERO,
    }
}

pub fn sessions_for(launcher: FakeLauncher) -> (Arc<BrowserSessions>, Arc<FakeState>) {
    let state = launcher.state();
    (
        Arc::new(BrowserSessions::new(Arc::new(launcher), test_profile())),
        state,
    )
}

/// A search page with `count` product cards and no bootstrap state.
pub fn dom_only_search_page(count: usize) -> String {
    let cards: String = (1..=count)
        .map(|i| {
            format!(
                r#"<li class="card"><a href="/w/product/dom-{i}"><img src="//image.idus.com/dom-{i}.jpg">
                <p>작가{i}</p><p>수제 상품 {i}</p><p>{price}원</p><p>4.{i} ({i}0)</p></a></li>"#,
                price = 10_000 + i * 1_000
            )
        })
        .collect();
    format!("<html><head><title>검색</title></head><body><ul>{cards}</ul></body></html>")
}
