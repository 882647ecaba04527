//! 网络协作方接口
//!
//! 状态机不关心数据从哪来，实现方对接真实网络层，测试用 MockFetcher。

use async_trait::async_trait;

use crate::error::ErrorInfo;
use crate::state::{LoadKind, PageData};

/// fetch_more 的返回：下一页数据块与是否还有更多
#[derive(Clone, Debug, PartialEq)]
pub struct FetchMore<T> {
    pub chunk: T,
    pub has_more: bool,
}

/// 单个数据源的取数接口
///
/// 同一页面的多个源共享一个 Fetcher 实现，按 id 分发。
/// 失败用 ErrorInfo 表达（网络错误、HTTP 状态码等在实现侧归类）。
#[async_trait]
pub trait Fetcher<T: PageData>: Send + Sync {
    /// 取整页数据（首屏或刷新，kind 供实现方区分缓存策略）
    async fn fetch(&self, id: &str, kind: LoadKind) -> Result<T, ErrorInfo>;

    /// 取下一页；cursor 为已加载页数
    async fn fetch_more(&self, id: &str, cursor: u64) -> Result<FetchMore<T>, ErrorInfo>;
}
