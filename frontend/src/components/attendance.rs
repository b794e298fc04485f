//! 考勤页面
//!
//! 通用考勤与保育员考勤共用同一组页面，只是接口前缀不同（见 `AttendanceScope`）。

mod list;
mod record;
mod take;

pub use list::AttendanceListPage;
pub use record::{AttendanceRecordPage, StatsGrid};
pub use take::{CreateAttendancePage, TakeAttendancePage};

use schoolhub_shared::{AttendanceRecord, Timestamp};

/// 记录日期的展示文本，无法解析时原样返回
pub(crate) fn record_date(record: &AttendanceRecord) -> String {
    Timestamp::parse(&record.date)
        .map(|t| t.display_short())
        .unwrap_or_else(|| record.date.clone())
}

/// 年级与班级的展示文本
pub(crate) fn class_label(record: &AttendanceRecord) -> String {
    match (record.grade.as_deref(), record.section.as_deref()) {
        (Some(g), Some(s)) => format!("Grade {} - {}", g, s),
        (Some(g), None) => format!("Grade {}", g),
        (None, Some(s)) => format!("Section {}", s),
        (None, None) => "-".to_string(),
    }
}
