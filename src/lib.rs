//! Pageload - 页面加载状态机
//!
//! 把「一张页面由多个数据源拼成」的加载问题建模为显式状态机：
//! 每个源独立经历 Idle / Loading / Loaded / Failed，刷新失败回滚旧数据，
//! 页面级错误展示档位由聚合函数从全体源状态推导。
//!
//! 模块划分：
//! - **state**: 单数据源状态机（PageState / LoadMoreState / PageData）
//! - **source**: 数据源登记表与错误聚合（SourceRegistry / aggregate）
//! - **store**: 单写者 owner 循环、命令句柄、快照发布与刷新等待
//! - **fetch**: 取数接口（Fetcher）与测试用 MockFetcher
//! - **gate**: 动作防抖门（Disabled / TaskBased / Cooldown / Combine）
//! - **events**: 状态变迁的广播事件流
//! - **error**: 失败值（ErrorInfo）与操作错误（StoreError）
//! - **config**: 运行配置加载（TOML + 环境变量）
//! - **observability**: tracing 初始化与 fetch 审计日志约定

pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod gate;
pub mod observability;
pub mod source;
pub mod state;
pub mod store;

pub use config::{load_config, reload_config, PageLoadConfig};
pub use error::{ErrorClass, ErrorInfo, StoreError};
pub use events::PageEvent;
pub use fetch::{FetchMore, Fetcher, MockFetcher};
pub use gate::{ActionGate, GatePermit, GatePolicy};
pub use source::{
    aggregate, ErrorDisplayMode, ErrorSummary, Source, SourceId, SourceRegistry, SourceRole,
};
pub use state::{LoadKind, LoadMoreState, PageData, PageState, Prev};
pub use store::{PageSnapshot, PageStore, PageStoreBuilder, RefreshHandle, RefreshOutcome};
