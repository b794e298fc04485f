//! REST 端点协议
//!
//! 每个端点是一个实现了 [`ApiRequest`] 的请求类型，携带方法、路径、
//! 查询参数、是否需要令牌、超时以及响应类型。网关只认这个 trait。

use crate::attendance::{AttendanceRecord, AttendanceScope, StudentEntry};
use crate::chat::ChatMessage;
use crate::identity::{Identity, IdentityPatch, Role};
use crate::lesson_plan::{LessonPlan, LessonPlanDraft, LessonPlanKind, RejectionReason};
use crate::theme::Theme;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned, de::IgnoredAny};
use std::time::Duration;

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// 是否携带 JSON 请求体
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// 是否需要 `Authorization: Bearer` 头
    const AUTH: bool = true;

    /// The URL path, relative to the API base.
    fn path(&self) -> String;

    fn query(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// 单次请求的中止时限，None 表示不设限
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// 各类调用的中止时限
pub mod timeouts {
    use std::time::Duration;

    pub const CHAT_HISTORY: Duration = Duration::from_secs(10);
    pub const DEPARTMENT_LIST: Duration = Duration::from_secs(30);
    pub const ADMIN_REPORT: Duration = Duration::from_secs(30);
    pub const AI_GENERATION: Duration = Duration::from_secs(60);
    pub const HOMEWORK_CHAT: Duration = Duration::from_secs(60);
    pub const PARENT_ASSISTANT: Duration = Duration::from_secs(60);
    pub const FILE_UPLOAD: Duration = Duration::from_secs(600);
}

// =========================================================
// 通用响应
// =========================================================

/// 不关心内容的成功响应，空响应体与任意 JSON 都接受
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Ack;

impl<'de> Deserialize<'de> for Ack {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Ack)
    }
}

/// 只带提示信息的响应
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// 用户资料响应：可能包在 `user` 字段里，也可能直接是用户对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserEnvelope {
    Wrapped { user: Identity },
    Bare(Identity),
}

impl UserEnvelope {
    pub fn into_identity(self) -> Identity {
        match self {
            UserEnvelope::Wrapped { user } => user,
            UserEnvelope::Bare(user) => user,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<Identity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub pages: u32,
}

impl Pagination {
    pub fn is_last(&self) -> bool {
        self.page >= self.pages
    }
}

/// 接口偶尔把单元素列表返回成对象
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}

// =========================================================
// 认证
// =========================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

impl ApiRequest for SignupRequest {
    type Response = SignupResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: bool = false;
    fn path(&self) -> String {
        "/auth/signup".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: Identity,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl ApiRequest for LoginRequest {
    type Response = AuthResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: bool = false;
    fn path(&self) -> String {
        "/auth/login".into()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl ApiRequest for LogoutRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        "/auth/logout".into()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl ApiRequest for RefreshRequest {
    type Response = RefreshResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: bool = false;
    fn path(&self) -> String {
        "/auth/refresh".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyEmailRequest {
    #[serde(skip)]
    pub token: String,
}

impl ApiRequest for VerifyEmailRequest {
    type Response = MessageResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTH: bool = false;
    fn path(&self) -> String {
        "/auth/verify-email".into()
    }
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("token", self.token.clone())]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

impl ApiRequest for ResendVerificationRequest {
    type Response = MessageResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: bool = false;
    fn path(&self) -> String {
        "/auth/resend-verification".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckVerificationStatusRequest {
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatus {
    #[serde(default)]
    pub is_verified: bool,
}

impl ApiRequest for CheckVerificationStatusRequest {
    type Response = VerificationStatus;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: bool = false;
    fn path(&self) -> String {
        "/auth/check-verification-status".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl ApiRequest for ForgotPasswordRequest {
    type Response = MessageResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: bool = false;
    fn path(&self) -> String {
        "/auth/forgot-password".into()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

impl ApiRequest for ResetPasswordRequest {
    type Response = MessageResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: bool = false;
    fn path(&self) -> String {
        "/auth/reset-password".into()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ApiRequest for ChangePasswordRequest {
    type Response = MessageResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        "/auth/change-password".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileRequest;

impl ApiRequest for ProfileRequest {
    type Response = UserEnvelope;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/auth/profile".into()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct UpdateUserRequest(pub IdentityPatch);

impl ApiRequest for UpdateUserRequest {
    type Response = UserEnvelope;
    const METHOD: HttpMethod = HttpMethod::Put;
    fn path(&self) -> String {
        "/auth/user/update".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteUserRequest;

impl ApiRequest for DeleteUserRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;
    fn path(&self) -> String {
        "/auth/user/delete".into()
    }
}

// =========================================================
// OAuth
// =========================================================

/// 浏览器跳转入口，不经过网关
pub const GOOGLE_AUTH_PATH: &str = "/auth/google";

#[derive(Debug, Clone, Serialize)]
pub struct AutoVerifyOAuthRequest;

impl ApiRequest for AutoVerifyOAuthRequest {
    type Response = MessageResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        "/auth/auto-verify-oauth".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetPasswordResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<Identity>,
}

impl ApiRequest for SetPasswordRequest {
    type Response = SetPasswordResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        "/auth/set-password".into()
    }
}

// =========================================================
// 主题
// =========================================================

#[derive(Debug, Clone, Serialize)]
pub struct GetThemeRequest;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThemeResponse {
    #[serde(default)]
    pub theme: Option<Theme>,
}

impl ApiRequest for GetThemeRequest {
    type Response = ThemeResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/auth/user/theme".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateThemeRequest {
    pub theme: Theme,
}

impl ApiRequest for UpdateThemeRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Put;
    fn path(&self) -> String {
        "/auth/user/theme".into()
    }
}

// =========================================================
// 聊天
// =========================================================

#[derive(Debug, Clone, Serialize)]
pub struct ChatUsersRequest;

impl ApiRequest for ChatUsersRequest {
    type Response = UsersResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/chat/users".into()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatMessagesRequest {
    pub room: String,
    pub with_user: Option<String>,
    /// 分页游标（最早一条消息的时间戳）
    pub before: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ApiRequest for ChatMessagesRequest {
    type Response = MessagesResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/chat/messages".into()
    }
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("room", self.room.clone())];
        if let Some(user) = &self.with_user {
            query.push(("withUser", user.clone()));
        }
        if let Some(before) = &self.before {
            query.push(("before", before.clone()));
        }
        query
    }
    fn timeout(&self) -> Option<Duration> {
        Some(timeouts::CHAT_HISTORY)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteMessageRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for DeleteMessageRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;
    fn path(&self) -> String {
        format!("/chat/messages/{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadCountRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(default, alias = "unreadCount")]
    pub count: u32,
}

impl ApiRequest for UnreadCountRequest {
    type Response = UnreadCount;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/chat/unread-count".into()
    }
}

// =========================================================
// 教案（教师）
// =========================================================

/// 单个教案响应：教师端包在 `lessonPlan` 里，审核端直接返回
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LessonPlanEnvelope {
    Wrapped {
        #[serde(rename = "lessonPlan")]
        lesson_plan: LessonPlan,
    },
    Bare(LessonPlan),
}

impl LessonPlanEnvelope {
    pub fn into_plan(self) -> LessonPlan {
        match self {
            LessonPlanEnvelope::Wrapped { lesson_plan } => lesson_plan,
            LessonPlanEnvelope::Bare(plan) => plan,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlansResponse {
    #[serde(default, deserialize_with = "one_or_many")]
    pub lesson_plans: Vec<LessonPlan>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CreateLessonPlanRequest(pub LessonPlanDraft);

impl ApiRequest for CreateLessonPlanRequest {
    type Response = LessonPlanEnvelope;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        "/teacher/lesson-plans".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateLessonPlanRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub draft: LessonPlanDraft,
}

impl ApiRequest for UpdateLessonPlanRequest {
    type Response = LessonPlanEnvelope;
    const METHOD: HttpMethod = HttpMethod::Put;
    fn path(&self) -> String {
        format!("/teacher/lesson-plans/{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteLessonPlanRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for DeleteLessonPlanRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;
    fn path(&self) -> String {
        format!("/teacher/lesson-plans/{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherLessonPlansRequest;

impl ApiRequest for TeacherLessonPlansRequest {
    type Response = LessonPlansResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/teacher/lesson-plans".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherLessonPlanRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for TeacherLessonPlanRequest {
    type Response = LessonPlanEnvelope;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        format!("/teacher/lesson-plans/{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitLessonPlanRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for SubmitLessonPlanRequest {
    type Response = LessonPlanEnvelope;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        format!("/teacher/lesson-plans/{}/submit", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateAiLessonPlanRequest {
    pub grade: String,
    pub topic: String,
    pub subject: String,
}

/// AI 生成结果（未保存，回填到表单）
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GeneratedLessonPlan {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub grade: String,
}

impl GeneratedLessonPlan {
    pub fn into_draft(self) -> LessonPlanDraft {
        LessonPlanDraft {
            title: self.title,
            description: self.description,
            subject: self.subject,
            grade: self.grade,
            kind: LessonPlanKind::Ai,
        }
    }
}

impl ApiRequest for GenerateAiLessonPlanRequest {
    type Response = GeneratedLessonPlan;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        "/teacher/lesson-plans/generate-ai".into()
    }
    fn timeout(&self) -> Option<Duration> {
        Some(timeouts::AI_GENERATION)
    }
}

/// 文件上传（multipart，由前端组装表单）
pub const UPLOAD_LESSON_PLAN_PATH: &str = "/teacher/lesson-plans/upload";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadLessonPlanMeta {
    pub grade: String,
    pub topic: String,
    pub subject: String,
}

impl UploadLessonPlanMeta {
    /// 除文件外的表单字段
    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("grade", self.grade.as_str()),
            ("topic", self.topic.as_str()),
            ("subject", self.subject.as_str()),
        ]
    }
}

// =========================================================
// 教案（审核）
// =========================================================

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentLessonPlansRequest {
    #[serde(skip)]
    pub subject: String,
}

impl ApiRequest for DepartmentLessonPlansRequest {
    type Response = LessonPlansResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/department/lesson-plans".into()
    }
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("subject", self.subject.clone())]
    }
    fn timeout(&self) -> Option<Duration> {
        Some(timeouts::DEPARTMENT_LIST)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentLessonPlanRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for DepartmentLessonPlanRequest {
    type Response = LessonPlanEnvelope;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        format!("/department/lesson-plans/{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptLessonPlanRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for AcceptLessonPlanRequest {
    type Response = LessonPlanEnvelope;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        format!("/department/lesson-plans/{}/accept", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectLessonPlanRequest {
    #[serde(skip)]
    pub id: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted_text: Option<String>,
}

impl ApiRequest for RejectLessonPlanRequest {
    type Response = LessonPlanEnvelope;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        format!("/department/lesson-plans/{}/reject", self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectionReasonsRequest;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionReasonsResponse {
    #[serde(default)]
    pub rejection_reasons: Vec<RejectionReason>,
}

impl ApiRequest for RejectionReasonsRequest {
    type Response = RejectionReasonsResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/department/rejection-reasons".into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveRejectionReasonRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for ResolveRejectionReasonRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        format!("/department/rejection-reasons/{}/resolve", self.id)
    }
}

// =========================================================
// 考勤
// =========================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendanceRequest {
    #[serde(skip)]
    pub scope: AttendanceScope,
    pub student_count: usize,
    pub students: Vec<StudentEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RecordResponse {
    #[serde(default)]
    pub record: Option<AttendanceRecord>,
}

impl ApiRequest for CreateAttendanceRequest {
    type Response = RecordResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        self.scope.base_path().into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceListRequest {
    #[serde(skip)]
    pub scope: AttendanceScope,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RecordsResponse {
    #[serde(default)]
    pub records: Vec<AttendanceRecord>,
}

impl ApiRequest for AttendanceListRequest {
    type Response = RecordsResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        self.scope.base_path().into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecordRequest {
    #[serde(skip)]
    pub scope: AttendanceScope,
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for AttendanceRecordRequest {
    type Response = RecordResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        format!("{}/{}", self.scope.base_path(), self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteAttendanceRequest {
    #[serde(skip)]
    pub scope: AttendanceScope,
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for DeleteAttendanceRequest {
    type Response = Ack;
    const METHOD: HttpMethod = HttpMethod::Delete;
    fn path(&self) -> String {
        format!("{}/{}", self.scope.base_path(), self.id)
    }
}

// =========================================================
// 管理
// =========================================================

#[derive(Debug, Clone, Serialize)]
pub struct AdminUsersRequest;

impl ApiRequest for AdminUsersRequest {
    type Response = UsersResponse;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/admin/users".into()
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminLessonPlansRequest {
    #[serde(skip)]
    pub page: u32,
    #[serde(skip)]
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlanReportPage {
    #[serde(default)]
    pub lesson_plans: Vec<LessonPlan>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl ApiRequest for AdminLessonPlansRequest {
    type Response = LessonPlanReportPage;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/admin/lesson-plans".into()
    }
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("page", self.page.to_string()), ("limit", self.limit.to_string())]
    }
    fn timeout(&self) -> Option<Duration> {
        Some(timeouts::ADMIN_REPORT)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminAttendancesRequest {
    #[serde(skip)]
    pub page: u32,
    #[serde(skip)]
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AttendanceReportPage {
    #[serde(default)]
    pub attendances: Vec<AttendanceRecord>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl ApiRequest for AdminAttendancesRequest {
    type Response = AttendanceReportPage;
    const METHOD: HttpMethod = HttpMethod::Get;
    fn path(&self) -> String {
        "/admin/attendances".into()
    }
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("page", self.page.to_string()), ("limit", self.limit.to_string())]
    }
    fn timeout(&self) -> Option<Duration> {
        Some(timeouts::ADMIN_REPORT)
    }
}

// =========================================================
// AI 助手
// =========================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeworkChatRequest {
    pub question: String,
}

impl ApiRequest for HomeworkChatRequest {
    type Response = AnswerResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        "/homework/chat".into()
    }
    fn timeout(&self) -> Option<Duration> {
        Some(timeouts::HOMEWORK_CHAT)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParentAssistantRequest {
    pub question: String,
}

impl ApiRequest for ParentAssistantRequest {
    type Response = AnswerResponse;
    const METHOD: HttpMethod = HttpMethod::Post;
    fn path(&self) -> String {
        "/parent/ai-assistant".into()
    }
    fn timeout(&self) -> Option<Duration> {
        Some(timeouts::PARENT_ASSISTANT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_ids_are_not_serialized() {
        let req = RejectLessonPlanRequest {
            id: "lp1".into(),
            reason: "Too short".into(),
            highlighted_text: Some("intro".into()),
        };
        assert_eq!(req.path(), "/department/lesson-plans/lp1/reject");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({"reason": "Too short", "highlightedText": "intro"})
        );

        let submit = SubmitLessonPlanRequest { id: "lp1".into() };
        assert_eq!(serde_json::to_string(&submit).unwrap(), "{}");
    }

    #[test]
    fn chat_history_query_and_timeout() {
        let req = ChatMessagesRequest {
            room: "public".into(),
            with_user: None,
            before: Some("2024-05-01T08:30:00.000Z".into()),
        };
        assert_eq!(
            req.query(),
            vec![
                ("room", "public".to_string()),
                ("before", "2024-05-01T08:30:00.000Z".to_string())
            ]
        );
        assert_eq!(req.timeout(), Some(Duration::from_secs(10)));
        assert!(!HttpMethod::Get.has_body());
    }

    #[test]
    fn attendance_scope_selects_prefix() {
        let general = AttendanceRecordRequest {
            scope: AttendanceScope::General,
            id: "r1".into(),
        };
        let babysitter = DeleteAttendanceRequest {
            scope: AttendanceScope::Babysitter,
            id: "r1".into(),
        };
        assert_eq!(general.path(), "/attendance/r1");
        assert_eq!(babysitter.path(), "/babysitter/attendance/r1");
    }

    #[test]
    fn envelopes_accept_both_shapes() {
        let wrapped: UserEnvelope =
            serde_json::from_str(r#"{"user":{"_id":"u1","fullName":"Ada"}}"#).unwrap();
        let bare: UserEnvelope = serde_json::from_str(r#"{"_id":"u1","fullName":"Ada"}"#).unwrap();
        assert_eq!(wrapped.into_identity(), bare.into_identity());

        let plan: LessonPlanEnvelope =
            serde_json::from_str(r#"{"lessonPlan":{"_id":"lp1","status":"pending"}}"#).unwrap();
        assert_eq!(plan.into_plan().id, "lp1");
    }

    #[test]
    fn lesson_plan_list_accepts_single_object() {
        let single: LessonPlansResponse =
            serde_json::from_str(r#"{"lessonPlans":{"_id":"lp1"}}"#).unwrap();
        assert_eq!(single.lesson_plans.len(), 1);
        let none: LessonPlansResponse = serde_json::from_str(r#"{"lessonPlans":null}"#).unwrap();
        assert!(none.lesson_plans.is_empty());
        let missing: LessonPlansResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.lesson_plans.is_empty());
    }

    #[test]
    fn ack_accepts_anything() {
        assert_eq!(serde_json::from_str::<Ack>("null").unwrap(), Ack);
        assert_eq!(serde_json::from_str::<Ack>(r#"{"message":"deleted"}"#).unwrap(), Ack);
    }

    #[test]
    fn login_is_unauthenticated() {
        assert!(!<LoginRequest as ApiRequest>::AUTH);
        assert!(<ProfileRequest as ApiRequest>::AUTH);
    }
}
