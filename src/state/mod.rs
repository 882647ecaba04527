//! 页面加载状态机
//!
//! data 定义页面数据的最小约束，machine 定义单数据源的状态与变迁。

pub mod data;
pub mod machine;

pub use data::PageData;
pub use machine::{LoadKind, LoadMoreState, PageState, Prev};
