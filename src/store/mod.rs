//! 页面存储：命令 / 快照契约的实现
//!
//! builder 装配并启动 owner，handle 是对外入口，refresh 提供有界等待，
//! snapshot 是 watch 通道发布的不可变视图。

pub mod builder;
pub(crate) mod command;
pub mod handle;
pub(crate) mod owner;
pub mod refresh;
pub mod snapshot;

pub use builder::PageStoreBuilder;
pub use handle::PageStore;
pub use refresh::{RefreshHandle, RefreshOutcome};
pub use snapshot::PageSnapshot;
