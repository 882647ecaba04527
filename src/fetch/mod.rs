//! 取数接口与测试用 Mock

pub mod mock;
pub mod traits;

pub use mock::MockFetcher;
pub use traits::{FetchMore, Fetcher};
