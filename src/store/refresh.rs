//! 刷新等待句柄
//!
//! 下拉刷新的调用方拿到句柄后可等待目标源全部落定，等待是有界的：
//! 到达上限就归还控制权，在途请求不取消，落地后照常更新状态。

use std::time::{Duration, Instant};

use tokio::sync::{oneshot, watch};

use crate::source::SourceId;
use crate::store::snapshot::PageSnapshot;

/// 一次刷新的等待结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// 目标源是否都已落定；false 表示等待超时先行返回
    pub settled: bool,
    /// 实际等待时长
    pub elapsed: Duration,
}

/// 刷新句柄：PageStore::refresh 的返回值
pub struct RefreshHandle<T> {
    pub(crate) targets: Vec<SourceId>,
    pub(crate) armed: Option<oneshot::Receiver<()>>,
    pub(crate) snapshot_rx: watch::Receiver<PageSnapshot<T>>,
    pub(crate) max_wait: Duration,
}

impl<T> RefreshHandle<T> {
    /// 等到所有目标源落定，或超出等待上限
    ///
    /// 先等 owner 回执（Loading 已发布），再以快照流观察落定；
    /// 没有回执就直接看快照，避免 owner 已退出时卡住。
    pub async fn settled(mut self) -> RefreshOutcome {
        let start = Instant::now();

        if let Some(armed) = self.armed.take() {
            let armed_wait = tokio::time::timeout(self.max_wait, armed).await;
            if armed_wait.is_err() {
                // owner 迟迟没确认，按超时归还
                return RefreshOutcome {
                    settled: false,
                    elapsed: start.elapsed(),
                };
            }
        }

        let remaining = self.max_wait.saturating_sub(start.elapsed());
        let targets = self.targets;
        let waited = tokio::time::timeout(
            remaining,
            self.snapshot_rx.wait_for(|snap| snap.all_settled(&targets)),
        )
        .await;

        RefreshOutcome {
            settled: matches!(waited, Ok(Ok(_))),
            elapsed: start.elapsed(),
        }
    }

    /// 等待的目标源
    pub fn targets(&self) -> &[SourceId] {
        &self.targets
    }
}
