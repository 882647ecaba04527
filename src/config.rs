//! 运行配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PAGELOAD__*` 覆盖（双下划线表示嵌套，如 `PAGELOAD__FETCH__TIMEOUT_MS=5000`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageLoadConfig {
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub refresh: RefreshSection,
    #[serde(default)]
    pub gate: GateSection,
}

/// [fetch] 段：单次取数的软超时与并发上限
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSection {
    /// 单次 fetch 超时（毫秒），到期折叠为 Timeout 失败
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,
    /// 同时在途的 fetch 上限
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_fetch_timeout_ms(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_max_concurrent() -> usize {
    8
}

/// [refresh] 段：下拉刷新的有界等待
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshSection {
    /// 刷新等待上限（毫秒），超过即归还控制权，在途请求不取消
    #[serde(default = "default_refresh_max_wait_ms")]
    pub max_wait_ms: u64,
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            max_wait_ms: default_refresh_max_wait_ms(),
        }
    }
}

fn default_refresh_max_wait_ms() -> u64 {
    8_000
}

/// [gate] 段：各防抖策略的默认时长
#[derive(Debug, Clone, Deserialize)]
pub struct GateSection {
    /// Disabled 策略的封锁窗口（毫秒）
    #[serde(default = "default_disable_window_ms")]
    pub disable_window_ms: u64,
    /// Cooldown 策略的冷却时长（毫秒）
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Combine 策略的合并窗口（毫秒）
    #[serde(default = "default_combine_window_ms")]
    pub combine_window_ms: u64,
}

impl Default for GateSection {
    fn default() -> Self {
        Self {
            disable_window_ms: default_disable_window_ms(),
            cooldown_ms: default_cooldown_ms(),
            combine_window_ms: default_combine_window_ms(),
        }
    }
}

fn default_disable_window_ms() -> u64 {
    500
}

fn default_cooldown_ms() -> u64 {
    1_000
}

fn default_combine_window_ms() -> u64 {
    300
}

impl Default for PageLoadConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSection::default(),
            refresh: RefreshSection::default(),
            gate: GateSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 PAGELOAD__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 PAGELOAD__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<PageLoadConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PAGELOAD")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

/// 重新从磁盘与环境变量加载配置；调用方拿到新配置后自行决定是否重建 store
pub fn reload_config() -> Result<PageLoadConfig, config::ConfigError> {
    load_config(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = PageLoadConfig::default();
        assert_eq!(cfg.fetch.timeout_ms, 10_000);
        assert_eq!(cfg.fetch.max_concurrent, 8);
        assert_eq!(cfg.refresh.max_wait_ms, 8_000);
        assert_eq!(cfg.gate.cooldown_ms, 1_000);
    }

    #[test]
    fn test_load_from_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[fetch]\ntimeout_ms = 2500\n\n[refresh]\nmax_wait_ms = 1000").unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.fetch.timeout_ms, 2500);
        assert_eq!(cfg.refresh.max_wait_ms, 1000);
        // 未覆盖的键保持默认
        assert_eq!(cfg.fetch.max_concurrent, 8);
    }

    #[test]
    fn test_reload_without_sources_yields_defaults() {
        let cfg = reload_config().unwrap();
        assert_eq!(cfg.fetch.timeout_ms, 10_000);
    }
}
