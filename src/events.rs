//! 页面事件流
//!
//! owner 在每次状态变迁后广播事件，UI / 埋点侧按需订阅。
//! 落后的订阅者会丢事件（broadcast lagged），状态本身以 watch 快照为准。

use serde::Serialize;

use crate::error::ErrorInfo;
use crate::source::{ErrorDisplayMode, SourceId};
use crate::state::LoadKind;

/// 事件通道容量：慢订阅者最多积压这么多条
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 页面加载过程中的可观测事件
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// 某个源进入 Loading
    SourceLoading {
        id: SourceId,
        kind: LoadKind,
        generation: u64,
    },
    /// 某个源加载成功
    SourceLoaded {
        id: SourceId,
        kind: LoadKind,
        generation: u64,
        elapsed_ms: u64,
    },
    /// 某个源加载失败
    SourceFailed {
        id: SourceId,
        kind: LoadKind,
        generation: u64,
        elapsed_ms: u64,
        error: ErrorInfo,
    },
    /// 过期代的回包被丢弃
    StaleDropped {
        id: SourceId,
        generation: u64,
        current: u64,
    },
    /// 某个源开始加载下一页
    MoreLoading { id: SourceId, cursor: u64 },
    /// 下一页加载成功
    MoreLoaded {
        id: SourceId,
        cursor: u64,
        has_more: bool,
        elapsed_ms: u64,
    },
    /// 下一页加载失败
    MoreFailed {
        id: SourceId,
        cursor: u64,
        elapsed_ms: u64,
        error: ErrorInfo,
    },
    /// 页面级错误档位发生变化
    ModeChanged {
        from: ErrorDisplayMode,
        to: ErrorDisplayMode,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = PageEvent::SourceLoading {
            id: "profile".to_string(),
            kind: LoadKind::Initial,
            generation: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "source_loading");
        assert_eq!(json["id"], "profile");
        assert_eq!(json["kind"], "initial");
    }

    #[test]
    fn test_mode_change_serializes_modes() {
        let event = PageEvent::ModeChanged {
            from: ErrorDisplayMode::None,
            to: ErrorDisplayMode::GlobalError,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "mode_changed");
        assert_eq!(json["from"], "none");
        assert_eq!(json["to"], "global_error");
    }
}
