//! 失败值与操作错误
//!
//! ErrorInfo 在 fetch 边界一次性创建、此后不可变；分类（ErrorClass）决定默认文案，
//! 调用方可按分类覆盖 message。StoreError 是 crate 自身的操作错误（thiserror）。

use serde::Serialize;
use thiserror::Error;

use crate::source::SourceId;

/// 失败分类：选择默认用户文案，并供上层按类型决定展示与重试策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// 网络不可达 / 连接失败
    Network,
    /// 请求超时
    Timeout,
    /// 服务端错误（5xx）
    Server,
    /// 认证失败（401 / 403）
    Auth,
    /// 资源不存在（404）
    NotFound,
    /// 请求非法（400）
    BadRequest,
    /// 限流（429）
    RateLimited,
    /// 维护中（503）
    Maintenance,
    /// 未分类
    Unknown,
}

impl ErrorClass {
    /// 各分类的默认用户文案；message 为空时由 user_message 取用
    pub fn default_copy(&self) -> &'static str {
        match self {
            ErrorClass::Network => "网络异常，请检查网络后重试",
            ErrorClass::Timeout => "请求超时，请稍后重试",
            ErrorClass::Server => "服务开小差了，请稍后重试",
            ErrorClass::Auth => "登录状态已失效，请重新登录",
            ErrorClass::NotFound => "内容不存在或已下线",
            ErrorClass::BadRequest => "请求参数有误",
            ErrorClass::RateLimited => "操作太频繁，请稍后再试",
            ErrorClass::Maintenance => "系统维护中，请稍后访问",
            ErrorClass::Unknown => "加载失败，请重试",
        }
    }
}

/// 单次失败的描述：在失败边界创建后不再修改
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
#[error("[{code}] {message}")]
pub struct ErrorInfo {
    /// 错误码（业务码或 HTTP 状态码字符串）
    pub code: String,
    /// 开发侧描述；为空时 user_message 回退到分类默认文案
    pub message: String,
    /// 失败分类
    pub class: ErrorClass,
    /// 创建时间（毫秒时间戳）
    pub occurred_at: i64,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            class: ErrorClass::Unknown,
            occurred_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// 指定分类
    pub fn with_class(mut self, class: ErrorClass) -> Self {
        self.class = class;
        self
    }

    /// 从 HTTP 状态码创建：400/401/403/404/429/503/5xx 映射到对应分类
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(status.to_string(), message).with_class(classify_status(status))
    }

    /// 网络不可达
    pub fn network(message: impl Into<String>) -> Self {
        Self::new("network", message).with_class(ErrorClass::Network)
    }

    /// 超时（fetch 软超时到期时由 owner 折叠为此类）
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new("timeout", message).with_class(ErrorClass::Timeout)
    }

    /// 用户可见文案：优先 message，为空则取分类默认文案
    pub fn user_message(&self) -> &str {
        if self.message.is_empty() {
            self.class.default_copy()
        } else {
            &self.message
        }
    }
}

fn classify_status(status: u16) -> ErrorClass {
    match status {
        400 => ErrorClass::BadRequest,
        401 | 403 => ErrorClass::Auth,
        404 => ErrorClass::NotFound,
        429 => ErrorClass::RateLimited,
        503 => ErrorClass::Maintenance,
        s if s >= 500 => ErrorClass::Server,
        _ => ErrorClass::Unknown,
    }
}

/// crate 操作错误（区别于 ErrorInfo：后者描述数据源的加载失败）
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate source id: {0}")]
    DuplicateSource(SourceId),

    #[error("Unknown source id: {0}")]
    UnknownSource(SourceId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert_eq!(ErrorInfo::from_status(400, "").class, ErrorClass::BadRequest);
        assert_eq!(ErrorInfo::from_status(401, "").class, ErrorClass::Auth);
        assert_eq!(ErrorInfo::from_status(403, "").class, ErrorClass::Auth);
        assert_eq!(ErrorInfo::from_status(404, "").class, ErrorClass::NotFound);
        assert_eq!(ErrorInfo::from_status(429, "").class, ErrorClass::RateLimited);
        assert_eq!(ErrorInfo::from_status(503, "").class, ErrorClass::Maintenance);
        assert_eq!(ErrorInfo::from_status(500, "").class, ErrorClass::Server);
        assert_eq!(ErrorInfo::from_status(502, "").class, ErrorClass::Server);
        assert_eq!(ErrorInfo::from_status(302, "").class, ErrorClass::Unknown);
    }

    #[test]
    fn test_user_message_fallback() {
        let e = ErrorInfo::from_status(503, "");
        assert_eq!(e.user_message(), ErrorClass::Maintenance.default_copy());

        let e = ErrorInfo::from_status(503, "机房升级中");
        assert_eq!(e.user_message(), "机房升级中");
    }

    #[test]
    fn test_display_includes_code() {
        let e = ErrorInfo::new("E1001", "banner service unreachable");
        assert_eq!(e.to_string(), "[E1001] banner service unreachable");
    }

    #[test]
    fn test_timeout_constructor() {
        let e = ErrorInfo::timeout("fetch exceeded 10s");
        assert_eq!(e.class, ErrorClass::Timeout);
        assert_eq!(e.code, "timeout");
    }
}
