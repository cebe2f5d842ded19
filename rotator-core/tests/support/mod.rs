//! Scripted collaborators for driving the rotation runtime under paused time.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rotator_core::{
    ConfigError, ConfigSource, DashboardDescriptor, DashboardId, EasingKind,
    NavigationError, PageMetrics, PositionStore, PositionStoreError,
    RenderSurface, RotationSettings, ScrollSettings,
};
use tokio::time::Instant;
use url::Url;

pub fn dashboard(id: &str) -> DashboardDescriptor {
    let url = Url::parse(&format!("https://{id}.example.com/")).expect("url");
    DashboardDescriptor::from_url(url).with_id(id)
}

pub fn dashboards(ids: &[&str]) -> Vec<DashboardDescriptor> {
    ids.iter().map(|id| dashboard(id)).collect()
}

/// Five second dwell, four second linear scroll in 100ms steps.
pub fn settings() -> RotationSettings {
    RotationSettings {
        default_dwell: Duration::from_secs(5),
        scroll: ScrollSettings {
            duration: Duration::from_secs(4),
            min_step: Duration::from_millis(100),
            easing: EasingKind::Linear,
        },
        retry_limit: 3,
        backoff: Duration::from_secs(5),
        refresh_interval: Duration::from_secs(300),
        load_timeout: Duration::from_secs(30),
        clear_on_empty: false,
    }
}

/// Lets spawned tasks catch up without moving the paused clock.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

type Refresh = Result<Vec<DashboardDescriptor>, ConfigError>;

/// Answers refreshes from a script, then repeats the fallback forever.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Refresh>>,
    fallback: Refresh,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(fallback: Refresh) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(ids: &[&str]) -> Self {
        Self::new(Ok(dashboards(ids)))
    }

    pub fn then(self, next: Refresh) -> Self {
        self.script.lock().push_back(next);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigSource for ScriptedSource {
    async fn refresh(&self) -> Refresh {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[derive(Debug, Clone)]
pub enum Page {
    Loads(PageMetrics),
    Fails(NavigationError),
    Hangs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Load { host: String, at: Duration },
    Scroll { offset: f64, at: Duration },
}

/// Render surface that records every call with its offset from creation.
/// Hosts without a configured page load instantly with zero height.
pub struct RecordingSurface {
    started: Instant,
    pages: HashMap<String, Page>,
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            pages: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(mut self, id: &str, page: Page) -> Self {
        self.pages.insert(format!("{id}.example.com"), page);
        self
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    /// `(dashboard id, time)` of every load.
    pub fn loads(&self) -> Vec<(String, Duration)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Load { host, at } => Some((
                    host.trim_end_matches(".example.com").to_owned(),
                    *at,
                )),
                SurfaceCall::Scroll { .. } => None,
            })
            .collect()
    }

    pub fn loaded_ids(&self) -> Vec<String> {
        self.loads().into_iter().map(|(id, _)| id).collect()
    }

    pub fn scrolls(&self) -> Vec<(f64, Duration)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Scroll { offset, at } => Some((*offset, *at)),
                SurfaceCall::Load { .. } => None,
            })
            .collect()
    }

    fn elapsed(&self) -> Duration {
        Instant::now().duration_since(self.started)
    }
}

#[async_trait]
impl RenderSurface for RecordingSurface {
    async fn load(&self, url: &Url) -> Result<PageMetrics, NavigationError> {
        let host = url.host_str().unwrap_or_default().to_owned();
        self.calls.lock().push(SurfaceCall::Load {
            host: host.clone(),
            at: self.elapsed(),
        });
        match self.pages.get(&host).cloned() {
            Some(Page::Loads(metrics)) => Ok(metrics),
            Some(Page::Fails(error)) => Err(error),
            Some(Page::Hangs) => std::future::pending().await,
            None => Ok(PageMetrics::default()),
        }
    }

    fn scroll_to(&self, offset: f64) {
        self.calls.lock().push(SurfaceCall::Scroll {
            offset,
            at: self.elapsed(),
        });
    }
}

/// Position store whose saves take `delay` each. Records what it was asked
/// to save, in order.
pub struct SlowPositionStore {
    delay: Duration,
    saved: Mutex<Vec<DashboardId>>,
}

impl SlowPositionStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn saved(&self) -> Vec<DashboardId> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl PositionStore for SlowPositionStore {
    async fn load(&self) -> Result<Option<DashboardId>, PositionStoreError> {
        Ok(None)
    }

    async fn save(&self, id: &DashboardId) -> Result<(), PositionStoreError> {
        self.saved.lock().push(id.clone());
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Asserts `actual` is `expected` give or take the scheduling slack of the
/// paused clock.
pub fn assert_near(actual: Duration, expected: Duration) {
    let slack = Duration::from_millis(10);
    assert!(
        actual >= expected && actual < expected + slack,
        "expected {expected:?} (+{slack:?}), got {actual:?}"
    );
}
