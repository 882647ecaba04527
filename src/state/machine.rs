//! 单数据源的加载状态机
//!
//! PageState 是和类型：任意时刻恰好处于一种状态，成功与失败互斥。
//! 所有变迁方法都做合法性检查，非法变迁返回 false 并保持原状态不变，
//! 由 owner 决定记日志还是静默丢弃。

use crate::error::ErrorInfo;
use crate::state::data::PageData;

/// 触发加载的方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadKind {
    /// 首屏加载
    Initial,
    /// 刷新（保留旧数据展示）
    Refresh,
    /// 加载下一页
    LoadMore,
}

/// load more 的独立子状态：只在 Loaded 内有意义，失败不影响主状态
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMoreState {
    /// 可以加载下一页
    Idle,
    /// 下一页请求进行中
    Loading,
    /// 没有更多数据
    NoMore,
    /// 上次 load more 失败，可重试
    Failed(ErrorInfo),
    /// 首屏即为空列表
    Empty,
}

/// 刷新开始时保存的旧快照，失败时据此回滚
#[derive(Clone, Debug, PartialEq)]
pub struct Prev<T> {
    pub data: T,
    pub load_more: LoadMoreState,
}

/// 单数据源的页面状态
///
/// 变迁规则：
/// - Idle --begin(Initial)--> Loading
/// - Loaded --begin(Refresh)--> Loading（携带 prev，失败回滚）
/// - Failed / Idle --begin(Refresh)--> 退化为 Initial（无 prev）
/// - Loading --complete--> Loaded / --fail--> Failed 或回滚到 Loaded
#[derive(Clone, Debug, PartialEq)]
pub enum PageState<T> {
    /// 初始态，尚未发起过加载
    Idle,
    /// 加载进行中；刷新时 prev 保存旧数据供展示与回滚
    Loading {
        kind: LoadKind,
        prev: Option<Prev<T>>,
    },
    /// 加载成功；refresh_error 记录最近一次失败的刷新（旁路，不降级主状态）
    Loaded {
        data: T,
        load_more: LoadMoreState,
        refresh_error: Option<ErrorInfo>,
    },
    /// 首屏或无旧数据的刷新失败
    Failed { kind: LoadKind, error: ErrorInfo },
}

impl<T: PageData> PageState<T> {
    /// 尝试进入 Loading。返回 false 表示当前状态下该触发方式非法：
    /// Initial 只允许从 Idle 出发；Loading 中的重复触发由 owner 在上层处理（换代重挂）；
    /// LoadMore 不走主状态，见 begin_more。
    pub fn begin(&mut self, kind: LoadKind) -> bool {
        let next = match (&*self, kind) {
            (PageState::Idle, LoadKind::Initial) => PageState::Loading {
                kind: LoadKind::Initial,
                prev: None,
            },
            // 无旧数据的刷新退化为首屏语义
            (PageState::Idle, LoadKind::Refresh) | (PageState::Failed { .. }, LoadKind::Refresh) => {
                PageState::Loading {
                    kind: LoadKind::Initial,
                    prev: None,
                }
            }
            (PageState::Loaded { .. }, LoadKind::Refresh) => {
                let (data, load_more) = match std::mem::replace(self, PageState::Idle) {
                    PageState::Loaded {
                        data, load_more, ..
                    } => (data, load_more),
                    _ => unreachable!("matched Loaded above"),
                };
                PageState::Loading {
                    kind: LoadKind::Refresh,
                    prev: Some(Prev {
                        data,
                        // 进行中的 load more 会因换代被丢弃，回滚后回到可加载
                        load_more: match load_more {
                            LoadMoreState::Loading => LoadMoreState::Idle,
                            other => other,
                        },
                    }),
                }
            }
            _ => return false,
        };
        *self = next;
        true
    }

    /// Loading -> Loaded。首屏数据为空时 load more 直接进入 Empty。
    pub fn complete(&mut self, data: T) -> bool {
        if !matches!(self, PageState::Loading { .. }) {
            return false;
        }
        let load_more = if data.is_empty() {
            LoadMoreState::Empty
        } else {
            LoadMoreState::Idle
        };
        *self = PageState::Loaded {
            data,
            load_more,
            refresh_error: None,
        };
        true
    }

    /// Loading -> Failed，或（刷新失败且有 prev 时）回滚到 Loaded 并挂 refresh_error
    pub fn fail(&mut self, error: ErrorInfo) -> bool {
        let (kind, prev) = match std::mem::replace(self, PageState::Idle) {
            PageState::Loading { kind, prev } => (kind, prev),
            other => {
                *self = other;
                return false;
            }
        };
        *self = match prev {
            Some(Prev { data, load_more }) => PageState::Loaded {
                data,
                load_more,
                refresh_error: Some(error),
            },
            None => PageState::Failed { kind, error },
        };
        true
    }

    /// load more 子状态 Idle / Failed -> Loading。
    /// 已在 Loading 的重复触发返回 false（合并请求），NoMore / Empty 下也返回 false。
    pub fn begin_more(&mut self) -> bool {
        match self {
            PageState::Loaded { load_more, .. } => match load_more {
                LoadMoreState::Idle | LoadMoreState::Failed(_) => {
                    *load_more = LoadMoreState::Loading;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// load more 成功：合并数据，按 has_more 进入 Idle 或 NoMore
    pub fn complete_more(&mut self, chunk: T, has_more: bool) -> bool {
        match self {
            PageState::Loaded {
                data, load_more, ..
            } if *load_more == LoadMoreState::Loading => {
                data.merge(chunk);
                *load_more = if has_more {
                    LoadMoreState::Idle
                } else {
                    LoadMoreState::NoMore
                };
                true
            }
            _ => false,
        }
    }

    /// load more 失败：只降级子状态，主状态与已有数据不动
    pub fn fail_more(&mut self, error: ErrorInfo) -> bool {
        match self {
            PageState::Loaded { load_more, .. } if *load_more == LoadMoreState::Loading => {
                *load_more = LoadMoreState::Failed(error);
                true
            }
            _ => false,
        }
    }
}

impl<T> PageState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, PageState::Loading { .. })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, PageState::Loaded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PageState::Failed { .. })
    }

    /// 主状态不在 Loading（刷新等待的判定条件；load more 进行中不算未落定）
    pub fn is_settled(&self) -> bool {
        !self.is_loading()
    }

    /// 处于 Loading 时返回其触发方式
    pub fn loading_kind(&self) -> Option<LoadKind> {
        match self {
            PageState::Loading { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// 当前应展示的数据：Loaded 的数据，或刷新进行中保留的旧数据
    pub fn data(&self) -> Option<&T> {
        match self {
            PageState::Loaded { data, .. } => Some(data),
            PageState::Loading {
                prev: Some(Prev { data, .. }),
                ..
            } => Some(data),
            _ => None,
        }
    }

    /// 当前挂着的错误：Failed 的主错误，或 Loaded 上的刷新失败旁路
    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            PageState::Failed { error, .. } => Some(error),
            PageState::Loaded {
                refresh_error: Some(e),
                ..
            } => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;

    fn err(code: &str) -> ErrorInfo {
        ErrorInfo::new(code, "boom").with_class(ErrorClass::Server)
    }

    #[test]
    fn test_initial_only_from_idle() {
        let mut s: PageState<Vec<i32>> = PageState::Idle;
        assert!(s.begin(LoadKind::Initial));
        assert!(s.is_loading());

        let mut s: PageState<Vec<i32>> = PageState::Loaded {
            data: vec![1],
            load_more: LoadMoreState::Idle,
            refresh_error: None,
        };
        assert!(!s.begin(LoadKind::Initial));
        assert!(s.is_loaded());
    }

    #[test]
    fn test_initial_success_and_failure() {
        let mut s: PageState<Vec<i32>> = PageState::Idle;
        s.begin(LoadKind::Initial);
        assert!(s.complete(vec![1, 2]));
        assert_eq!(s.data(), Some(&vec![1, 2]));

        let mut s: PageState<Vec<i32>> = PageState::Idle;
        s.begin(LoadKind::Initial);
        assert!(s.fail(err("500")));
        assert!(s.is_failed());
        assert_eq!(s.error().map(|e| e.code.as_str()), Some("500"));
    }

    #[test]
    fn test_empty_first_page_enters_empty() {
        let mut s: PageState<Vec<i32>> = PageState::Idle;
        s.begin(LoadKind::Initial);
        s.complete(vec![]);
        match &s {
            PageState::Loaded { load_more, .. } => assert_eq!(*load_more, LoadMoreState::Empty),
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn test_refresh_keeps_prev_and_rolls_back_on_failure() {
        let mut s: PageState<Vec<i32>> = PageState::Idle;
        s.begin(LoadKind::Initial);
        s.complete(vec![1, 2]);

        assert!(s.begin(LoadKind::Refresh));
        // 刷新进行中旧数据仍可展示
        assert_eq!(s.data(), Some(&vec![1, 2]));

        assert!(s.fail(err("503")));
        match &s {
            PageState::Loaded {
                data,
                refresh_error,
                ..
            } => {
                assert_eq!(data, &vec![1, 2]);
                assert_eq!(refresh_error.as_ref().map(|e| e.code.as_str()), Some("503"));
            }
            other => panic!("expected rollback to Loaded, got {other:?}"),
        }
    }

    #[test]
    fn test_refresh_success_clears_refresh_error() {
        let mut s: PageState<Vec<i32>> = PageState::Loaded {
            data: vec![1],
            load_more: LoadMoreState::Idle,
            refresh_error: Some(err("503")),
        };
        s.begin(LoadKind::Refresh);
        s.complete(vec![9]);
        match &s {
            PageState::Loaded {
                data,
                refresh_error,
                ..
            } => {
                assert_eq!(data, &vec![9]);
                assert!(refresh_error.is_none());
            }
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn test_refresh_from_failed_degrades_to_initial() {
        let mut s: PageState<Vec<i32>> = PageState::Failed {
            kind: LoadKind::Initial,
            error: err("500"),
        };
        assert!(s.begin(LoadKind::Refresh));
        match &s {
            PageState::Loading { kind, prev } => {
                assert_eq!(*kind, LoadKind::Initial);
                assert!(prev.is_none());
            }
            other => panic!("expected Loading, got {other:?}"),
        }
        // 无 prev 的失败回到 Failed 而非回滚
        s.fail(err("502"));
        assert!(s.is_failed());
    }

    #[test]
    fn test_load_more_lifecycle() {
        let mut s: PageState<Vec<i32>> = PageState::Idle;
        s.begin(LoadKind::Initial);
        s.complete(vec![1]);

        assert!(s.begin_more());
        // 进行中重复触发被合并
        assert!(!s.begin_more());

        assert!(s.complete_more(vec![2, 3], true));
        assert_eq!(s.data(), Some(&vec![1, 2, 3]));

        assert!(s.begin_more());
        assert!(s.complete_more(vec![4], false));
        match &s {
            PageState::Loaded { load_more, .. } => assert_eq!(*load_more, LoadMoreState::NoMore),
            other => panic!("expected Loaded, got {other:?}"),
        }
        // NoMore 后不再允许触发
        assert!(!s.begin_more());
    }

    #[test]
    fn test_load_more_failure_keeps_data() {
        let mut s: PageState<Vec<i32>> = PageState::Idle;
        s.begin(LoadKind::Initial);
        s.complete(vec![1]);
        s.begin_more();
        assert!(s.fail_more(err("timeout")));
        assert_eq!(s.data(), Some(&vec![1]));
        match &s {
            PageState::Loaded { load_more, .. } => {
                assert!(matches!(load_more, LoadMoreState::Failed(_)))
            }
            other => panic!("expected Loaded, got {other:?}"),
        }
        // 失败后可重试
        assert!(s.begin_more());
    }

    #[test]
    fn test_refresh_normalizes_inflight_load_more() {
        let mut s: PageState<Vec<i32>> = PageState::Idle;
        s.begin(LoadKind::Initial);
        s.complete(vec![1]);
        s.begin_more();

        s.begin(LoadKind::Refresh);
        s.fail(err("503"));
        match &s {
            PageState::Loaded { load_more, .. } => assert_eq!(*load_more, LoadMoreState::Idle),
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn test_stale_transitions_rejected() {
        let mut s: PageState<Vec<i32>> = PageState::Idle;
        assert!(!s.complete(vec![1]));
        assert!(!s.fail(err("500")));
        assert!(!s.complete_more(vec![1], true));
        assert_eq!(s, PageState::Idle);
    }
}
