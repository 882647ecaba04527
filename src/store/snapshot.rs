//! 对外发布的不可变快照
//!
//! owner 每次状态变迁后整体发布一份，读者持有的快照永不被原地修改。

use crate::source::{aggregate, ErrorSummary, SourceId, SourceRegistry};
use crate::state::PageState;

/// 登记表快照与同一时刻的聚合结果
#[derive(Clone, Debug)]
pub struct PageSnapshot<T> {
    pub registry: SourceRegistry<T>,
    pub summary: ErrorSummary,
}

impl<T> PageSnapshot<T> {
    /// 对登记表求聚合并打包成快照
    pub fn capture(registry: SourceRegistry<T>) -> Self {
        let summary = aggregate(&registry);
        Self { registry, summary }
    }

    pub fn state(&self, id: &str) -> Option<&PageState<T>> {
        self.registry.get(id).map(|s| &s.state)
    }

    /// 该源当前应展示的数据（Loaded 数据或刷新期间保留的旧数据）
    pub fn data(&self, id: &str) -> Option<&T> {
        self.state(id).and_then(|s| s.data())
    }

    /// 目标源是否全部落定
    pub fn all_settled(&self, ids: &[SourceId]) -> bool {
        self.registry.all_settled(ids.iter())
    }
}

impl<T> Default for PageSnapshot<T> {
    fn default() -> Self {
        Self::capture(SourceRegistry::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ErrorDisplayMode, SourceRole};

    #[test]
    fn test_capture_aggregates_once() {
        let mut reg: SourceRegistry<Vec<i32>> = SourceRegistry::new();
        reg.insert("a", SourceRole::Core).unwrap();
        let snap = PageSnapshot::capture(reg);
        assert_eq!(snap.summary.mode, ErrorDisplayMode::None);
        assert!(snap.state("a").is_some());
        assert!(snap.state("ghost").is_none());
    }
}
