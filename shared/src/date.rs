//! 时间类型模块
//!
//! `Timestamp` 是可序列化的 UTC 时间点。服务端以 RFC 3339 字符串传输，
//! 内部比较与匹配统一使用毫秒精度。

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

// =========================================================
// Timestamp - 可传输的时间戳类型
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// 当前时间（截断到毫秒，保证与服务端回显一致）
    pub fn now() -> Self {
        Self::from_millis(Utc::now().timestamp_millis())
    }

    /// 从毫秒时间戳创建，超出范围时回退到 Unix 纪元
    pub fn from_millis(ms: i64) -> Self {
        Self(Utc.timestamp_millis_opt(ms).single().unwrap_or_default())
    }

    /// 解析 RFC 3339 字符串
    pub fn parse(s: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }

    #[inline]
    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// 分页游标格式：`2024-05-01T08:30:00.123Z`
    pub fn to_cursor(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// 列表展示用的短格式
    pub fn display_short(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M").to_string()
    }

    pub fn display_time(&self) -> String {
        self.0.format("%H:%M").to_string()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_cursor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_is_millisecond_rfc3339() {
        let ts = Timestamp::from_millis(1_714_552_200_123);
        assert_eq!(ts.to_cursor(), "2024-05-01T08:30:00.123Z");
        assert_eq!(Timestamp::parse(&ts.to_cursor()), Some(ts));
    }

    #[test]
    fn parses_offsets_into_utc() {
        let ts = Timestamp::parse("2024-05-01T10:30:00.123+02:00").unwrap();
        assert_eq!(ts.as_millis(), 1_714_552_200_123);
    }

    #[test]
    fn serde_uses_string_form() {
        let ts = Timestamp::from_millis(0);
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.starts_with("\"1970-01-01T00:00:00"));
        let back: Timestamp = serde_json::from_str("\"1970-01-01T00:00:00.000Z\"").unwrap();
        assert_eq!(back, ts);
    }
}
