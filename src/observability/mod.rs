//! 可观测性
//!
//! 日志走 tracing，默认 info 级别，RUST_LOG 可覆盖。
//! owner 对每次落定的 fetch 以 audit 字段输出一行 JSON，供埋点侧采集。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 初始化日志订阅；作为库被嵌入时由宿主调用一次，
/// 重复调用（如并行测试）保留第一次的配置
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .try_init();
}
