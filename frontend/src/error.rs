use std::fmt;

use serde::Deserialize;

// =========================================================
// 错误状态枚举
// =========================================================

/// 错误状态枚举
/// 每个状态对应一条面向用户的默认提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorStatus {
    /// 401: 带令牌的调用被拒绝，会话失效
    Unauthorized,
    /// 403: 无权限
    Forbidden,
    /// 429: 请求过于频繁
    RateLimited,
    /// 500: 服务端错误
    Server,
    /// 其他非 2xx：使用后端返回的 error/message 字段
    Rejected,
    /// fetch 本身失败（断网、CORS 等）
    Network,
    /// 中止计时器触发
    Timeout,
    /// 2xx 但响应体为空或不是合法 JSON
    Parse,
    /// 需要令牌但当前没有会话
    NotAuthenticated,
}

impl ApiErrorStatus {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiErrorStatus::Unauthorized => "UNAUTHORIZED",
            ApiErrorStatus::Forbidden => "FORBIDDEN",
            ApiErrorStatus::RateLimited => "RATE_LIMITED",
            ApiErrorStatus::Server => "SERVER_ERROR",
            ApiErrorStatus::Rejected => "REJECTED",
            ApiErrorStatus::Network => "NETWORK_ERROR",
            ApiErrorStatus::Timeout => "TIMEOUT",
            ApiErrorStatus::Parse => "PARSE_ERROR",
            ApiErrorStatus::NotAuthenticated => "NOT_AUTHENTICATED",
        }
    }

    /// 固定提示文案；Rejected 没有固定文案，使用后端消息
    pub fn default_message(&self) -> &'static str {
        match self {
            ApiErrorStatus::Unauthorized => "Session expired. Please log in again.",
            ApiErrorStatus::Forbidden => {
                "Access denied. You do not have permission to perform this action."
            }
            ApiErrorStatus::RateLimited => "Too many requests. Please try again later.",
            ApiErrorStatus::Server => "Server error. Please try again later.",
            ApiErrorStatus::Rejected => "Request failed",
            ApiErrorStatus::Network => "Network error. Please check your connection and try again.",
            ApiErrorStatus::Timeout => "Request timed out. Please try again.",
            ApiErrorStatus::Parse => "Response parsing failed, please retry.",
            ApiErrorStatus::NotAuthenticated => "You are not signed in.",
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSpan {
    /// 操作名称，如 "session.refresh", "chat.history"
    pub operation: String,
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

const EMPTY_BODY_OP: &str = "response.empty";

// =========================================================
// 核心错误类型
// =========================================================

/// 网关与各页面共用的请求错误
///
/// - status: 错误分类
/// - message: 展示给用户的文案
/// - spans: 调用追踪，仅用于日志
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: ApiErrorStatus,
    pub message: String,
    spans: Vec<ErrorSpan>,
}

impl ApiError {
    pub fn new(status: ApiErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            spans: Vec::new(),
        }
    }

    /// 使用状态的默认文案
    pub fn from_status(status: ApiErrorStatus) -> Self {
        Self::new(status, status.default_message())
    }

    // --- Convenience constructors ---

    pub fn unauthorized() -> Self {
        Self::from_status(ApiErrorStatus::Unauthorized)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Rejected, message)
    }

    pub fn network() -> Self {
        Self::from_status(ApiErrorStatus::Network)
    }

    pub fn timeout() -> Self {
        Self::from_status(ApiErrorStatus::Timeout)
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Self::from_status(ApiErrorStatus::Parse).in_op_with("response.parse", detail)
    }

    /// 2xx 但响应体为空
    pub fn empty_body() -> Self {
        Self::from_status(ApiErrorStatus::Parse).in_op(EMPTY_BODY_OP)
    }

    pub fn not_authenticated() -> Self {
        Self::from_status(ApiErrorStatus::NotAuthenticated)
    }

    /// 把非 2xx 响应映射为错误；`body` 为原始响应体
    pub fn from_response(status: u16, body: &str) -> Self {
        match status {
            401 => Self::unauthorized(),
            403 => Self::from_status(ApiErrorStatus::Forbidden),
            429 => Self::from_status(ApiErrorStatus::RateLimited),
            500 => Self::from_status(ApiErrorStatus::Server),
            _ => {
                let message = serde_json::from_str::<BackendErrorBody>(body)
                    .ok()
                    .and_then(BackendErrorBody::into_message)
                    .unwrap_or_else(|| ApiErrorStatus::Rejected.default_message().to_string());
                Self::rejected(message).in_op_with("http.status", status.to_string())
            }
        }
    }

    // --- Context builders (Builder Pattern) ---

    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    // --- Accessors ---

    pub fn is(&self, status: ApiErrorStatus) -> bool {
        self.status == status
    }

    /// 页面内联展示的文案
    pub fn user_message(&self) -> &str {
        &self.message
    }

    pub fn is_empty_body(&self) -> bool {
        self.is(ApiErrorStatus::Parse) && self.spans.iter().any(|s| s.operation == EMPTY_BODY_OP)
    }
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

// =========================================================
// 后端错误响应体
// =========================================================

/// 后端错误体，`error` 优先于 `message`
#[derive(Debug, Default, Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl BackendErrorBody {
    fn into_message(self) -> Option<String> {
        self.error
            .filter(|s| !s.trim().is_empty())
            .or(self.message.filter(|s| !s.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_statuses_ignore_backend_text() {
        let body = r#"{"error":"custom"}"#;
        assert_eq!(
            ApiError::from_response(401, body).user_message(),
            "Session expired. Please log in again."
        );
        assert_eq!(
            ApiError::from_response(403, body).user_message(),
            "Access denied. You do not have permission to perform this action."
        );
        assert_eq!(
            ApiError::from_response(429, body).user_message(),
            "Too many requests. Please try again later."
        );
        assert_eq!(
            ApiError::from_response(500, body).user_message(),
            "Server error. Please try again later."
        );
    }

    #[test]
    fn other_statuses_use_backend_text() {
        let err = ApiError::from_response(400, r#"{"error":"Email already used","message":"x"}"#);
        assert!(err.is(ApiErrorStatus::Rejected));
        assert_eq!(err.user_message(), "Email already used");

        let err = ApiError::from_response(404, r#"{"message":"Not here"}"#);
        assert_eq!(err.user_message(), "Not here");

        let err = ApiError::from_response(502, "<html>bad gateway</html>");
        assert_eq!(err.user_message(), "Request failed");
    }

    #[test]
    fn display_includes_trace() {
        let err = ApiError::timeout().in_op("chat.history").in_op_with("room", "public");
        assert_eq!(
            err.to_string(),
            "[TIMEOUT] Request timed out. Please try again. | trace: chat.history -> room(public)"
        );
    }
}
