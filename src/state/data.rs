//! 页面数据的最小约束
//!
//! 状态机不关心数据长什么样，只需要两个能力：追加合并（load more）与判空（Empty 判定）。

/// 可分页的页面数据
///
/// 异构页面（不同 source 返回不同结构）用一个枚举包裹后实现本 trait，
/// 单列表页直接用 `Vec<Item>`（有 blanket 实现）。
pub trait PageData: Clone + Send + Sync + 'static {
    /// 把下一页数据合并进当前数据（load more 成功后由 owner 调用）
    fn merge(&mut self, chunk: Self);

    /// 首屏数据是否为空（决定 load more 初始是否进入 Empty）
    fn is_empty(&self) -> bool;
}

impl<I> PageData for Vec<I>
where
    I: Clone + Send + Sync + 'static,
{
    fn merge(&mut self, chunk: Self) {
        self.extend(chunk);
    }

    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_merge_appends_in_order() {
        let mut data = vec![1, 2, 3];
        data.merge(vec![4, 5]);
        assert_eq!(data, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_vec_is_empty() {
        let empty: Vec<i32> = vec![];
        assert!(PageData::is_empty(&empty));
        assert!(!PageData::is_empty(&vec![1]));
    }
}
