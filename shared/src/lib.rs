pub mod attendance;
pub mod chat;
pub mod date;
pub mod identity;
pub mod lesson_plan;
pub mod nav;
pub mod protocol;
pub mod school;
pub mod theme;

pub use attendance::{AttendanceRecord, AttendanceScope, AttendanceSheet, AttendanceStats, StudentEntry};
pub use chat::{ChatMessage, ChatTimeline, ClientEvent, OutgoingMessage, ServerEvent};
pub use date::Timestamp;
pub use identity::{Identity, IdentityPatch, Role, Session};
pub use lesson_plan::{LessonPlan, LessonPlanDraft, LessonPlanKind, LessonPlanStatus, PlanAction};
pub use protocol::{ApiRequest, HttpMethod};
pub use theme::Theme;

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 持久化存储键
pub const STORAGE_USER_KEY: &str = "user";
pub const STORAGE_ACCESS_TOKEN_KEY: &str = "accessToken";
pub const STORAGE_REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const STORAGE_THEME_PREFIX: &str = "app-theme";

pub const SESSION_STORAGE_KEYS: [&str; 3] = [
    STORAGE_USER_KEY,
    STORAGE_ACCESS_TOKEN_KEY,
    STORAGE_REFRESH_TOKEN_KEY,
];

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

/// 默认聊天房间
pub const PUBLIC_ROOM: &str = "public";

/// 聊天历史分页大小
pub const CHAT_PAGE_SIZE: usize = 50;
