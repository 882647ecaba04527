//! 页面存储装配
//!
//! 注册数据源、配置取数器与参数，build 时建立通道并启动 owner 循环。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::config::PageLoadConfig;
use crate::error::StoreError;
use crate::events::{PageEvent, EVENT_CHANNEL_CAPACITY};
use crate::fetch::{Fetcher, MockFetcher};
use crate::source::{SourceId, SourceRegistry, SourceRole};
use crate::state::PageData;
use crate::store::handle::PageStore;
use crate::store::owner::PageOwner;
use crate::store::snapshot::PageSnapshot;

/// PageStore 的装配器
pub struct PageStoreBuilder<T: PageData> {
    registry: SourceRegistry<T>,
    fetcher: Option<Arc<dyn Fetcher<T>>>,
    config: PageLoadConfig,
    register_error: Option<StoreError>,
}

impl<T: PageData> PageStoreBuilder<T> {
    pub fn new() -> Self {
        Self {
            registry: SourceRegistry::new(),
            fetcher: None,
            config: PageLoadConfig::default(),
            register_error: None,
        }
    }

    pub fn with_config(mut self, config: PageLoadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher<T>>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// 注册一个数据源；id 重复的错误推迟到 build 时上报
    pub fn source(mut self, id: impl Into<SourceId>, role: SourceRole) -> Self {
        if let Err(e) = self.registry.insert(id, role) {
            if self.register_error.is_none() {
                self.register_error = Some(e);
            }
        }
        self
    }

    pub fn core(self, id: impl Into<SourceId>) -> Self {
        self.source(id, SourceRole::Core)
    }

    pub fn component(self, id: impl Into<SourceId>) -> Self {
        self.source(id, SourceRole::Component)
    }

    /// 装配并启动 owner 循环；须在 Tokio runtime 内调用
    pub fn build(self) -> Result<PageStore<T>, StoreError> {
        if let Some(e) = self.register_error {
            return Err(e);
        }
        let fetcher = self.fetcher.unwrap_or_else(|| {
            tracing::warn!("no fetcher provided, using MockFetcher");
            Arc::new(MockFetcher::new())
        });
        let cfg = self.config;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(PageSnapshot::capture(self.registry.clone()));
        let (events, _) = broadcast::channel::<PageEvent>(EVENT_CHANNEL_CAPACITY);
        // 并发上限至少为 1
        let semaphore = Arc::new(Semaphore::new(cfg.fetch.max_concurrent.max(1)));
        let shutdown = CancellationToken::new();

        let owner = PageOwner {
            registry: self.registry,
            fetcher,
            fetch_timeout: Duration::from_millis(cfg.fetch.timeout_ms),
            cmd_rx,
            outcome_tx,
            outcome_rx,
            snapshot_tx,
            events: events.clone(),
            semaphore,
            shutdown: shutdown.clone(),
        };
        tokio::spawn(owner.run());

        Ok(PageStore {
            cmd_tx,
            snapshot_rx,
            events,
            refresh_max_wait: Duration::from_millis(cfg.refresh.max_wait_ms),
            shutdown,
        })
    }
}

impl<T: PageData> Default for PageStoreBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_source_fails_build() {
        let result = PageStoreBuilder::<Vec<i32>>::new()
            .core("profile")
            .component("profile")
            .with_fetcher(Arc::new(MockFetcher::new()))
            .build();
        assert!(matches!(
            result,
            Err(StoreError::DuplicateSource(id)) if id == "profile"
        ));
    }

    #[tokio::test]
    async fn test_build_without_fetcher_falls_back_to_mock() {
        let store: PageStore<Vec<i32>> = PageStoreBuilder::new().core("a").build().unwrap();
        store.load("a");

        // Mock 队列为空，最终落在 mock_exhausted 失败上
        let mut rx = store.watch();
        tokio::time::timeout(
            Duration::from_secs(2),
            rx.wait_for(|s| s.state("a").map(|st| st.is_failed()).unwrap_or(false)),
        )
        .await
        .unwrap()
        .unwrap();

        let state = store.state("a").unwrap();
        assert_eq!(state.error().map(|e| e.code.as_str()), Some("mock_exhausted"));
        store.shutdown();
    }
}
