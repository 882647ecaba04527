//! 页面句柄
//!
//! 可克隆的对外入口：命令方法封装 Command 发送，读取方法基于 watch 快照。
//! 句柄全部丢弃后 owner 循环自行退出。

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::events::PageEvent;
use crate::source::{ErrorSummary, SourceId, SourceRole};
use crate::state::{PageData, PageState};
use crate::store::command::Command;
use crate::store::refresh::RefreshHandle;
use crate::store::snapshot::PageSnapshot;

/// 页面存储句柄
#[derive(Clone)]
pub struct PageStore<T: PageData> {
    pub(crate) cmd_tx: mpsc::UnboundedSender<Command>,
    pub(crate) snapshot_rx: watch::Receiver<PageSnapshot<T>>,
    pub(crate) events: broadcast::Sender<PageEvent>,
    pub(crate) refresh_max_wait: Duration,
    pub(crate) shutdown: CancellationToken,
}

impl<T: PageData> PageStore<T> {
    fn send(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::warn!("page store closed, command dropped");
        }
    }

    /// 首屏加载一个源（仅 Idle 状态会真正出发）
    pub fn load(&self, id: impl Into<SourceId>) {
        self.send(Command::Load { id: id.into() });
    }

    /// 首屏加载所有已注册源
    pub fn load_all(&self) {
        let ids = self.snapshot_rx.borrow().registry.ids();
        for id in ids {
            self.send(Command::Load { id });
        }
    }

    /// 刷新指定源，返回可等待落定的句柄
    pub fn refresh(
        &self,
        ids: impl IntoIterator<Item = impl Into<SourceId>>,
    ) -> RefreshHandle<T> {
        let targets: Vec<SourceId> = ids.into_iter().map(Into::into).collect();
        let snapshot_rx = self.snapshot_rx.clone();
        let (armed_tx, armed_rx) = oneshot::channel();
        self.send(Command::Refresh {
            ids: targets.clone(),
            armed: Some(armed_tx),
        });
        RefreshHandle {
            targets,
            armed: Some(armed_rx),
            snapshot_rx,
            max_wait: self.refresh_max_wait,
        }
    }

    /// 刷新所有已注册源
    pub fn refresh_all(&self) -> RefreshHandle<T> {
        let ids = self.snapshot_rx.borrow().registry.ids();
        self.refresh(ids)
    }

    /// 加载下一页；进行中的重复触发被合并为无操作
    pub fn load_more(&self, id: impl Into<SourceId>) {
        self.send(Command::LoadMore { id: id.into() });
    }

    /// 重试单个失败源
    pub fn retry(&self, id: impl Into<SourceId>) {
        self.send(Command::Retry { id: id.into() });
    }

    /// 批量重试
    pub fn retry_batch(&self, ids: impl IntoIterator<Item = impl Into<SourceId>>) {
        self.send(Command::RetryBatch {
            ids: ids.into_iter().map(Into::into).collect(),
        });
    }

    /// 重试所有失败源；给定 role 时只重试该角色
    pub fn retry_all(&self, role: Option<SourceRole>) {
        self.send(Command::RetryAll { role });
    }

    /// 请求 owner 退出；在途 fetch 会被取消信号截断
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// 关闭信号 token（owner 退出后触发）
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 当前快照（整体克隆）
    pub fn snapshot(&self) -> PageSnapshot<T> {
        self.snapshot_rx.borrow().clone()
    }

    /// 单个源的当前状态
    pub fn state(&self, id: &str) -> Result<PageState<T>, StoreError> {
        self.snapshot_rx
            .borrow()
            .state(id)
            .cloned()
            .ok_or_else(|| StoreError::UnknownSource(id.to_string()))
    }

    /// 当前聚合结果
    pub fn aggregate(&self) -> ErrorSummary {
        self.snapshot_rx.borrow().summary.clone()
    }

    /// 订阅页面事件流
    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    /// 订阅快照变化（UI 渲染循环用）
    pub fn watch(&self) -> watch::Receiver<PageSnapshot<T>> {
        self.snapshot_rx.clone()
    }
}
