//! 从句柄发往 owner 的命令

use tokio::sync::oneshot;

use crate::source::{SourceId, SourceRole};

/// 页面命令；全部由 PageStore 的方法封装发送
#[derive(Debug)]
pub(crate) enum Command {
    /// 首屏加载单个源（仅 Idle 可出发）
    Load { id: SourceId },
    /// 刷新指定源；armed 在 Loading 状态发布之后回执，
    /// 刷新等待方以此为起点观察落定，避免拿旧快照误判
    Refresh {
        ids: Vec<SourceId>,
        armed: Option<oneshot::Sender<()>>,
    },
    /// 加载下一页（进行中重复触发会被合并）
    LoadMore { id: SourceId },
    /// 重试单个失败源
    Retry { id: SourceId },
    /// 批量重试
    RetryBatch { ids: Vec<SourceId> },
    /// 重试所有失败源；给定 role 时只重试该角色
    RetryAll { role: Option<SourceRole> },
    /// 结束 owner 循环
    Shutdown,
}
