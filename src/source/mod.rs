//! 数据源登记与页面级错误聚合

pub mod aggregate;
pub mod registry;

pub use aggregate::{aggregate, ErrorDisplayMode, ErrorSummary};
pub use registry::{Source, SourceId, SourceRegistry, SourceRole};
