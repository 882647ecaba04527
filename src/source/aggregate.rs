//! 页面级错误聚合
//!
//! 对登记表快照做一次纯函数折叠，得出错误计数、失败源列表与展示档位。
//! 同一快照算两次结果必须完全一致，没有任何隐藏计数器。

use crate::source::registry::{SourceId, SourceRegistry};
use crate::source::SourceRole;

/// 页面级错误展示档位
///
/// Core 源失败且整页失败数达到 2，升级为全局错误横幅；
/// 其余有失败的情况走分区内联错误（含多个 Component 同时失败的情况，
/// 没有 Core 失败就不拉全局横幅）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorDisplayMode {
    /// 没有任何失败
    None,
    /// 各失败分区自行渲染内联错误与定点重试
    ComponentErrorsOnly,
    /// 页面级错误横幅，提供对所有失败源的批量重试
    GlobalError,
}

/// 聚合结果：计数、失败 id 列表（注册顺序）与档位
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ErrorSummary {
    pub core_failed: Vec<SourceId>,
    pub component_failed: Vec<SourceId>,
    pub mode: ErrorDisplayMode,
}

impl ErrorSummary {
    pub fn core_error_count(&self) -> usize {
        self.core_failed.len()
    }

    pub fn component_error_count(&self) -> usize {
        self.component_failed.len()
    }

    pub fn failed_count(&self) -> usize {
        self.core_failed.len() + self.component_failed.len()
    }

    pub fn has_errors(&self) -> bool {
        self.failed_count() > 0
    }

    /// 渲染层开关：只显示分区内联错误
    pub fn show_component_errors_only(&self) -> bool {
        self.mode == ErrorDisplayMode::ComponentErrorsOnly
    }

    /// 渲染层开关：显示页面级错误横幅
    pub fn show_global_error_banner(&self) -> bool {
        self.mode == ErrorDisplayMode::GlobalError
    }

    /// 渲染层开关：提供"全部重试"入口（失败数达到 2 即给，不限档位）
    pub fn show_batch_retry_banner(&self) -> bool {
        self.failed_count() >= 2
    }

    /// 批量重试的目标：所有失败源（Core 在前）
    pub fn retry_targets(&self) -> Vec<SourceId> {
        self.core_failed
            .iter()
            .chain(self.component_failed.iter())
            .cloned()
            .collect()
    }
}

/// 对登记表快照求聚合结果
///
/// 一个源计为失败，当且仅当主状态为 Failed，或 Loaded 上挂着刷新失败旁路。
/// 档位规则：无失败为 None；Core 失败数 >= 1 且总失败数 >= 2 为 GlobalError；
/// 其余为 ComponentErrorsOnly。
pub fn aggregate<T>(registry: &SourceRegistry<T>) -> ErrorSummary {
    let mut core_failed = Vec::new();
    let mut component_failed = Vec::new();

    for source in registry.iter() {
        if source.state.error().is_some() {
            match source.role {
                SourceRole::Core => core_failed.push(source.id.clone()),
                SourceRole::Component => component_failed.push(source.id.clone()),
            }
        }
    }

    let core = core_failed.len();
    let total = core + component_failed.len();
    let mode = if total == 0 {
        ErrorDisplayMode::None
    } else if core >= 1 && total >= 2 {
        ErrorDisplayMode::GlobalError
    } else {
        ErrorDisplayMode::ComponentErrorsOnly
    };

    ErrorSummary {
        core_failed,
        component_failed,
        mode,
    }
}
