//! 数据源登记表
//!
//! 一张页面由若干数据源组成，按注册顺序排列。登记表是唯一的共享资源：
//! owner 独占写，读者拿克隆快照。

use crate::error::StoreError;
use crate::state::PageState;

/// 数据源标识
pub type SourceId = String;

/// 数据源角色：Core 失败会影响页面级错误展示，Component 失败只有局部内联效果
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    Core,
    Component,
}

/// 单个数据源的登记项
///
/// generation 是单调换代戳：每次发起 fetch 前由 owner 自增，
/// 回包携带发起时的代数，不等于当前代的回包直接丢弃。
/// cursor 记录已加载页数，fetch_more 以它为游标。
#[derive(Clone, Debug)]
pub struct Source<T> {
    pub id: SourceId,
    pub role: SourceRole,
    pub state: PageState<T>,
    pub generation: u64,
    pub cursor: u64,
}

/// 按注册顺序保存的数据源集合
#[derive(Clone, Debug)]
pub struct SourceRegistry<T> {
    sources: Vec<Source<T>>,
}

impl<T> SourceRegistry<T> {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// 注册一个数据源，初始为 Idle / 第 0 代。id 重复时报错。
    pub fn insert(&mut self, id: impl Into<SourceId>, role: SourceRole) -> Result<(), StoreError> {
        let id = id.into();
        if self.contains(&id) {
            return Err(StoreError::DuplicateSource(id));
        }
        self.sources.push(Source {
            id,
            role,
            state: PageState::Idle,
            generation: 0,
            cursor: 0,
        });
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sources.iter().any(|s| s.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Source<T>> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Source<T>> {
        self.sources.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source<T>> {
        self.sources.iter()
    }

    pub fn ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// 给定的目标源是否都已落定（不在主状态 Loading）。
    /// 未注册的 id 视为已落定，避免刷新等待被拼写错误卡死。
    pub fn all_settled<'a>(&self, ids: impl IntoIterator<Item = &'a SourceId>) -> bool {
        ids.into_iter().all(|id| {
            self.get(id)
                .map(|s| s.state.is_settled())
                .unwrap_or(true)
        })
    }
}

impl<T> Default for SourceRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LoadKind;

    #[test]
    fn test_insert_keeps_registration_order() {
        let mut reg: SourceRegistry<Vec<i32>> = SourceRegistry::new();
        reg.insert("profile", SourceRole::Core).unwrap();
        reg.insert("banners", SourceRole::Core).unwrap();
        reg.insert("reviews", SourceRole::Component).unwrap();
        assert_eq!(reg.ids(), vec!["profile", "banners", "reviews"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut reg: SourceRegistry<Vec<i32>> = SourceRegistry::new();
        reg.insert("profile", SourceRole::Core).unwrap();
        let err = reg.insert("profile", SourceRole::Component).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSource(id) if id == "profile"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_all_settled() {
        let mut reg: SourceRegistry<Vec<i32>> = SourceRegistry::new();
        reg.insert("a", SourceRole::Core).unwrap();
        reg.insert("b", SourceRole::Core).unwrap();

        let ids: Vec<SourceId> = vec!["a".into(), "b".into()];
        assert!(reg.all_settled(&ids));

        reg.get_mut("a").unwrap().state.begin(LoadKind::Initial);
        assert!(!reg.all_settled(&ids));

        reg.get_mut("a").unwrap().state.complete(vec![1]);
        assert!(reg.all_settled(&ids));

        // 未注册的 id 不阻塞落定判定
        let ghost: Vec<SourceId> = vec!["ghost".into()];
        assert!(reg.all_settled(&ghost));
    }
}
