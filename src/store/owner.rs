//! owner 循环：登记表的唯一写者
//!
//! 所有状态变迁都在这里串行发生。fetch 在独立任务里并发跑，结果连同派发时的
//! 代数回传给 owner；代数对不上的回包直接丢弃，保证晚到的旧响应不会覆盖新状态。

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, watch, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::error::ErrorInfo;
use crate::events::PageEvent;
use crate::fetch::{FetchMore, Fetcher};
use crate::source::{aggregate, SourceId, SourceRegistry};
use crate::state::{LoadKind, LoadMoreState, PageData, PageState};
use crate::store::command::Command;
use crate::store::snapshot::PageSnapshot;

/// fetch 任务回传的结果，带派发时的代数
#[derive(Debug)]
pub(crate) enum FetchOutcome<T> {
    Page {
        id: SourceId,
        generation: u64,
        kind: LoadKind,
        result: Result<T, ErrorInfo>,
        elapsed_ms: u64,
    },
    More {
        id: SourceId,
        generation: u64,
        cursor: u64,
        result: Result<FetchMore<T>, ErrorInfo>,
        elapsed_ms: u64,
    },
}

pub(crate) struct PageOwner<T: PageData> {
    pub(crate) registry: SourceRegistry<T>,
    pub(crate) fetcher: Arc<dyn Fetcher<T>>,
    pub(crate) fetch_timeout: Duration,
    pub(crate) cmd_rx: mpsc::UnboundedReceiver<Command>,
    pub(crate) outcome_tx: mpsc::UnboundedSender<FetchOutcome<T>>,
    pub(crate) outcome_rx: mpsc::UnboundedReceiver<FetchOutcome<T>>,
    pub(crate) snapshot_tx: watch::Sender<PageSnapshot<T>>,
    pub(crate) events: broadcast::Sender<PageEvent>,
    pub(crate) semaphore: Arc<Semaphore>,
    pub(crate) shutdown: CancellationToken,
}

impl<T: PageData> PageOwner<T> {
    pub(crate) async fn run(mut self) {
        tracing::debug!(sources = self.registry.len(), "page owner started");
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => break, // 所有句柄已丢弃，退出循环
                },
                Some(outcome) = self.outcome_rx.recv() => {
                    self.apply_outcome(outcome);
                }
            }
        }
        // 通知在途 fetch 尽快退出，不再回报
        self.shutdown.cancel();
        tracing::info!("page owner stopped");
    }

    /// 返回 false 表示收到 Shutdown，循环应当结束
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Load { id } => {
                if self.start_page(&id, LoadKind::Initial) {
                    self.publish();
                }
            }
            Command::Refresh { ids, armed } => {
                for id in &ids {
                    self.start_page(id, LoadKind::Refresh);
                }
                // 无论实际派发了几个，都先发布再回执；
                // 等待方从回执后的快照起观察落定
                self.publish();
                if let Some(tx) = armed {
                    let _ = tx.send(());
                }
            }
            Command::LoadMore { id } => {
                if self.start_more(&id) {
                    self.publish();
                }
            }
            Command::Retry { id } => {
                if self.retry_source(&id) {
                    self.publish();
                }
            }
            Command::RetryBatch { ids } => {
                let mut any = false;
                for id in &ids {
                    any |= self.retry_source(id);
                }
                if any {
                    self.publish();
                }
            }
            Command::RetryAll { role } => {
                // 聚合清单不收录 load more 失败，目标必须按登记表全量取。
                // 非失败源由 retry_source 原地忽略。
                let targets: Vec<SourceId> = self
                    .registry
                    .iter()
                    .filter(|s| role.map_or(true, |r| s.role == r))
                    .map(|s| s.id.clone())
                    .collect();
                let mut any = false;
                for id in &targets {
                    any |= self.retry_source(id);
                }
                if any {
                    self.publish();
                }
            }
            Command::Shutdown => return false,
        }
        true
    }

    /// 让一个源进入 Loading 并派发 fetch；返回是否真的派发了
    fn start_page(&mut self, id: &SourceId, kind: LoadKind) -> bool {
        let slot = match self.registry.get_mut(id) {
            Some(s) => s,
            None => {
                tracing::warn!(source = %id, "unknown source id, command ignored");
                return false;
            }
        };
        // 在途加载期间到来的刷新：状态留在 Loading，换代后重新派发，
        // 旧代的回包落地时会因代数不匹配被丢弃
        let rearm = slot.state.is_loading() && kind == LoadKind::Refresh;
        if !rearm && !slot.state.begin(kind) {
            tracing::debug!(source = %id, ?kind, "transition rejected in current state");
            return false;
        }
        slot.generation += 1;
        let generation = slot.generation;
        // begin 可能把无旧数据的刷新退化为首屏，按实际 kind 派发
        let kind = slot.state.loading_kind().unwrap_or(kind);
        let _ = self.events.send(PageEvent::SourceLoading {
            id: id.clone(),
            kind,
            generation,
        });
        self.dispatch_page(id.clone(), kind, generation);
        true
    }

    /// 让一个源的 load more 进入 Loading 并派发；合并重复触发
    fn start_more(&mut self, id: &SourceId) -> bool {
        let slot = match self.registry.get_mut(id) {
            Some(s) => s,
            None => {
                tracing::warn!(source = %id, "unknown source id, command ignored");
                return false;
            }
        };
        if !slot.state.begin_more() {
            tracing::debug!(source = %id, "load more coalesced or unavailable");
            return false;
        }
        let generation = slot.generation;
        let cursor = slot.cursor;
        let _ = self.events.send(PageEvent::MoreLoading {
            id: id.clone(),
            cursor,
        });
        self.dispatch_more(id.clone(), generation, cursor);
        true
    }

    /// 重试一个失败源：主状态失败（含刷新失败旁路）优先于 load more 失败
    fn retry_source(&mut self, id: &SourceId) -> bool {
        let slot = match self.registry.get(id) {
            Some(s) => s,
            None => {
                tracing::warn!(source = %id, "unknown source id, retry ignored");
                return false;
            }
        };
        let has_main_error = slot.state.error().is_some();
        let has_more_error = matches!(
            &slot.state,
            PageState::Loaded {
                load_more: LoadMoreState::Failed(_),
                ..
            }
        );
        if has_main_error {
            self.start_page(id, LoadKind::Refresh)
        } else if has_more_error {
            self.start_more(id)
        } else {
            tracing::debug!(source = %id, "retry on non-failed source ignored");
            false
        }
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome<T>) {
        match outcome {
            FetchOutcome::Page {
                id,
                generation,
                kind,
                result,
                elapsed_ms,
            } => self.apply_page(id, generation, kind, result, elapsed_ms),
            FetchOutcome::More {
                id,
                generation,
                cursor,
                result,
                elapsed_ms,
            } => self.apply_more(id, generation, cursor, result, elapsed_ms),
        }
    }

    fn apply_page(
        &mut self,
        id: SourceId,
        generation: u64,
        kind: LoadKind,
        result: Result<T, ErrorInfo>,
        elapsed_ms: u64,
    ) {
        let slot = match self.registry.get_mut(&id) {
            Some(s) => s,
            None => return,
        };
        if slot.generation != generation {
            let current = slot.generation;
            tracing::debug!(source = %id, generation, current, "stale fetch result dropped");
            let _ = self.events.send(PageEvent::StaleDropped {
                id,
                generation,
                current,
            });
            return;
        }
        let ok = result.is_ok();
        let error_code = result.as_ref().err().map(|e| e.code.clone());
        match result {
            Ok(data) => {
                if !slot.state.complete(data) {
                    return;
                }
                slot.cursor = 1;
                let _ = self.events.send(PageEvent::SourceLoaded {
                    id: id.clone(),
                    kind,
                    generation,
                    elapsed_ms,
                });
            }
            Err(error) => {
                if !slot.state.fail(error.clone()) {
                    return;
                }
                tracing::warn!(source = %id, ?kind, code = %error.code, "fetch failed");
                let _ = self.events.send(PageEvent::SourceFailed {
                    id: id.clone(),
                    kind,
                    generation,
                    elapsed_ms,
                    error,
                });
            }
        }
        let audit = serde_json::json!({
            "event": "fetch_audit",
            "source": id,
            "kind": kind,
            "generation": generation,
            "ok": ok,
            "elapsed_ms": elapsed_ms,
            "error_code": error_code,
        });
        tracing::info!(audit = %audit.to_string(), "fetch");
        self.publish();
    }

    fn apply_more(
        &mut self,
        id: SourceId,
        generation: u64,
        cursor: u64,
        result: Result<FetchMore<T>, ErrorInfo>,
        elapsed_ms: u64,
    ) {
        let slot = match self.registry.get_mut(&id) {
            Some(s) => s,
            None => return,
        };
        // 刷新换代会让在途的 load more 一并作废
        if slot.generation != generation {
            let current = slot.generation;
            tracing::debug!(source = %id, generation, current, "stale load more dropped");
            let _ = self.events.send(PageEvent::StaleDropped {
                id,
                generation,
                current,
            });
            return;
        }
        let ok = result.is_ok();
        let error_code = result.as_ref().err().map(|e| e.code.clone());
        match result {
            Ok(FetchMore { chunk, has_more }) => {
                if !slot.state.complete_more(chunk, has_more) {
                    return;
                }
                slot.cursor += 1;
                let _ = self.events.send(PageEvent::MoreLoaded {
                    id: id.clone(),
                    cursor,
                    has_more,
                    elapsed_ms,
                });
            }
            Err(error) => {
                if !slot.state.fail_more(error.clone()) {
                    return;
                }
                tracing::warn!(source = %id, cursor, code = %error.code, "load more failed");
                let _ = self.events.send(PageEvent::MoreFailed {
                    id: id.clone(),
                    cursor,
                    elapsed_ms,
                    error,
                });
            }
        }
        let audit = serde_json::json!({
            "event": "fetch_audit",
            "source": id,
            "kind": LoadKind::LoadMore,
            "generation": generation,
            "cursor": cursor,
            "ok": ok,
            "elapsed_ms": elapsed_ms,
            "error_code": error_code,
        });
        tracing::info!(audit = %audit.to_string(), "fetch");
        self.publish();
    }

    /// 重算聚合并整体发布新快照；档位变化时附带广播
    fn publish(&self) {
        let summary = aggregate(&self.registry);
        let prev_mode = self.snapshot_tx.borrow().summary.mode;
        if summary.mode != prev_mode {
            tracing::info!(from = ?prev_mode, to = ?summary.mode, "error display mode changed");
            let _ = self.events.send(PageEvent::ModeChanged {
                from: prev_mode,
                to: summary.mode,
            });
        }
        let _ = self.snapshot_tx.send(PageSnapshot {
            registry: self.registry.clone(),
            summary,
        });
    }

    fn dispatch_page(&self, id: SourceId, kind: LoadKind, generation: u64) {
        let fetcher = Arc::clone(&self.fetcher);
        let outcome_tx = self.outcome_tx.clone();
        let semaphore = Arc::clone(&self.semaphore);
        let token = self.shutdown.clone();
        let timeout = self.fetch_timeout;

        tokio::spawn(async move {
            let _permit = tokio::select! {
                _ = token.cancelled() => return,
                p = semaphore.acquire_owned() => match p {
                    Ok(p) => p,
                    Err(_) => return, // 信号量已关闭
                },
            };

            let start = Instant::now();
            let result = tokio::select! {
                _ = token.cancelled() => return, // 关闭中，不再回报
                r = tokio::time::timeout(timeout, fetcher.fetch(&id, kind)) => match r {
                    Ok(r) => r,
                    Err(_) => Err(ErrorInfo::timeout(format!(
                        "fetch {} exceeded {}ms",
                        id,
                        timeout.as_millis()
                    ))),
                },
            };
            let elapsed_ms = start.elapsed().as_millis() as u64;
            let _ = outcome_tx.send(FetchOutcome::Page {
                id,
                generation,
                kind,
                result,
                elapsed_ms,
            });
        });
    }

    fn dispatch_more(&self, id: SourceId, generation: u64, cursor: u64) {
        let fetcher = Arc::clone(&self.fetcher);
        let outcome_tx = self.outcome_tx.clone();
        let semaphore = Arc::clone(&self.semaphore);
        let token = self.shutdown.clone();
        let timeout = self.fetch_timeout;

        tokio::spawn(async move {
            let _permit = tokio::select! {
                _ = token.cancelled() => return,
                p = semaphore.acquire_owned() => match p {
                    Ok(p) => p,
                    Err(_) => return,
                },
            };

            let start = Instant::now();
            let result = tokio::select! {
                _ = token.cancelled() => return,
                r = tokio::time::timeout(timeout, fetcher.fetch_more(&id, cursor)) => match r {
                    Ok(r) => r,
                    Err(_) => Err(ErrorInfo::timeout(format!(
                        "fetch_more {} exceeded {}ms",
                        id,
                        timeout.as_millis()
                    ))),
                },
            };
            let elapsed_ms = start.elapsed().as_millis() as u64;
            let _ = outcome_tx.send(FetchOutcome::More {
                id,
                generation,
                cursor,
                result,
                elapsed_ms,
            });
        });
    }
}
