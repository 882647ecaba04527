//! Mock 取数器（用于测试，无需网络）
//!
//! 按源 id 预排响应队列，依次弹出；每条响应可带延迟模拟慢请求。
//! 队列耗尽时返回 mock_exhausted 错误，让脚本漏排在断言里暴露出来。

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{ErrorClass, ErrorInfo};
use crate::fetch::traits::{FetchMore, Fetcher};
use crate::state::{LoadKind, PageData};

struct Scripted<R> {
    result: R,
    delay: Duration,
}

/// 在途计数守卫：进入时登记并刷新峰值，退出（含调用方超时放弃）时回落
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 脚本化 Mock：每个源一条响应队列，记录调用次数与在途并发峰值
pub struct MockFetcher<T> {
    pages: Mutex<HashMap<String, VecDeque<Scripted<Result<T, ErrorInfo>>>>>,
    more: Mutex<HashMap<String, VecDeque<Scripted<Result<FetchMore<T>, ErrorInfo>>>>>,
    fetch_calls: Mutex<HashMap<String, usize>>,
    more_calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl<T> MockFetcher<T> {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            more: Mutex::new(HashMap::new()),
            fetch_calls: Mutex::new(HashMap::new()),
            more_calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// 预排一条整页响应（立即返回）
    pub async fn push_page(&self, id: &str, result: Result<T, ErrorInfo>) {
        self.push_page_delayed(id, result, Duration::ZERO).await;
    }

    /// 预排一条整页响应并指定延迟
    pub async fn push_page_delayed(&self, id: &str, result: Result<T, ErrorInfo>, delay: Duration) {
        self.pages
            .lock()
            .await
            .entry(id.to_string())
            .or_default()
            .push_back(Scripted { result, delay });
    }

    /// 预排一条下一页响应
    pub async fn push_more(&self, id: &str, result: Result<FetchMore<T>, ErrorInfo>) {
        self.push_more_delayed(id, result, Duration::ZERO).await;
    }

    /// 预排一条下一页响应并指定延迟
    pub async fn push_more_delayed(
        &self,
        id: &str,
        result: Result<FetchMore<T>, ErrorInfo>,
        delay: Duration,
    ) {
        self.more
            .lock()
            .await
            .entry(id.to_string())
            .or_default()
            .push_back(Scripted { result, delay });
    }

    /// 该源的整页 fetch 被调用了几次
    pub async fn page_calls(&self, id: &str) -> usize {
        self.fetch_calls.lock().await.get(id).copied().unwrap_or(0)
    }

    /// 该源的 fetch_more 被调用了几次
    pub async fn more_call_count(&self, id: &str) -> usize {
        self.more_calls.lock().await.get(id).copied().unwrap_or(0)
    }

    /// 同时在途的 fetch / fetch_more 最高并发数
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl<T> Default for MockFetcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn exhausted(id: &str) -> ErrorInfo {
    ErrorInfo::new("mock_exhausted", format!("no scripted response for {id}"))
        .with_class(ErrorClass::Unknown)
}

#[async_trait]
impl<T: PageData> Fetcher<T> for MockFetcher<T> {
    async fn fetch(&self, id: &str, _kind: LoadKind) -> Result<T, ErrorInfo> {
        let _running = InFlightGuard::enter(&self.in_flight, &self.peak_in_flight);
        *self
            .fetch_calls
            .lock()
            .await
            .entry(id.to_string())
            .or_insert(0) += 1;

        let next = self
            .pages
            .lock()
            .await
            .get_mut(id)
            .and_then(|q| q.pop_front());

        match next {
            Some(Scripted { result, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(exhausted(id)),
        }
    }

    async fn fetch_more(&self, id: &str, _cursor: u64) -> Result<FetchMore<T>, ErrorInfo> {
        let _running = InFlightGuard::enter(&self.in_flight, &self.peak_in_flight);
        *self
            .more_calls
            .lock()
            .await
            .entry(id.to_string())
            .or_insert(0) += 1;

        let next = self
            .more
            .lock()
            .await
            .get_mut(id)
            .and_then(|q| q.pop_front());

        match next {
            Some(Scripted { result, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(exhausted(id)),
        }
    }
}
