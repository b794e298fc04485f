//! 路由定义模块 - 领域模型
//!
//! 纯粹的路由表，不依赖 DOM。每个路由声明自己的访问要求，
//! 守卫据此决定放行、跳转还是拒绝。

use std::fmt::Display;

use schoolhub_shared::{AttendanceScope, Role};

/// 路由的访问要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    /// 需要已登录且已验证邮箱；`roles` 为 None 时任何角色都可访问
    Protected { roles: Option<&'static [Role]> },
}

const ANY_ROLE: RouteAccess = RouteAccess::Protected { roles: None };

const fn only(roles: &'static [Role]) -> RouteAccess {
    RouteAccess::Protected { roles: Some(roles) }
}

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    #[default]
    Login,
    Signup,
    CheckEmail,
    /// `/verify-email?token=` 与 `/verify/:token`
    VerifyEmail(Option<String>),
    ForgotPassword,
    ResetPassword(String),
    OAuthCallback,
    SetPassword,
    CompleteProfile,

    Dashboard,
    Chat,
    Settings,
    Profile,

    LessonPlanner,
    CreateLessonPlan,
    EditLessonPlan(String),
    LessonPlanDetail(String),
    CheckLessonPlans,
    RejectionReasons,

    AttendanceList(AttendanceScope),
    CreateAttendance(AttendanceScope),
    TakeAttendance(AttendanceScope, usize),
    ViewAttendance(AttendanceScope, String),

    ManageUsers,
    LessonPlanReport,
    AttendanceReport,

    HomeworkHelper,
    ParentAssistant,

    NotFound,
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn attendance_route(scope: AttendanceScope, rest: &[&str]) -> AppRoute {
    match rest {
        [] => AppRoute::AttendanceList(scope),
        ["create"] => AppRoute::CreateAttendance(scope),
        ["take", count] => count
            .parse()
            .map(|n| AppRoute::TakeAttendance(scope, n))
            .unwrap_or(AppRoute::NotFound),
        ["view", id] => AppRoute::ViewAttendance(scope, id.to_string()),
        _ => AppRoute::NotFound,
    }
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举（不含查询串）
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        match segments(path).as_slice() {
            [] | ["login"] => Self::Login,
            ["signup"] => Self::Signup,
            ["check-email"] | ["verify", "check-email"] => Self::CheckEmail,
            ["verify-email"] => Self::VerifyEmail(None),
            ["verify", token] => Self::VerifyEmail(Some(token.to_string())),
            ["forgot-password"] => Self::ForgotPassword,
            ["forgot-password", token] => Self::ResetPassword(token.to_string()),
            ["oauth-callback"] | ["oauth-success"] => Self::OAuthCallback,
            ["set-password"] => Self::SetPassword,
            ["complete-profile"] => Self::CompleteProfile,

            ["dashboard"] => Self::Dashboard,
            ["chat"] => Self::Chat,
            ["settings"] => Self::Settings,
            ["profile"] => Self::Profile,

            ["lesson-planner"] => Self::LessonPlanner,
            ["create-lesson-plan"] => Self::CreateLessonPlan,
            ["lesson-plan", id, "edit"] => Self::EditLessonPlan(id.to_string()),
            ["lesson-plan", id] => Self::LessonPlanDetail(id.to_string()),
            ["check-lesson-plans"] => Self::CheckLessonPlans,
            ["rejection-reasons"] => Self::RejectionReasons,

            ["attendance", rest @ ..] => attendance_route(AttendanceScope::General, rest),
            ["babysitter", "attendance", rest @ ..] => {
                attendance_route(AttendanceScope::Babysitter, rest)
            }

            ["manage-users"] => Self::ManageUsers,
            ["reports-lesson"] => Self::LessonPlanReport,
            ["reports-attendance"] => Self::AttendanceReport,

            ["homework"] => Self::HomeworkHelper,
            ["check-child"] => Self::ParentAssistant,

            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        match self {
            Self::Login => "/login".into(),
            Self::Signup => "/signup".into(),
            Self::CheckEmail => "/check-email".into(),
            Self::VerifyEmail(None) => "/verify-email".into(),
            Self::VerifyEmail(Some(token)) => format!("/verify/{}", token),
            Self::ForgotPassword => "/forgot-password".into(),
            Self::ResetPassword(token) => format!("/forgot-password/{}", token),
            Self::OAuthCallback => "/oauth-callback".into(),
            Self::SetPassword => "/set-password".into(),
            Self::CompleteProfile => "/complete-profile".into(),

            Self::Dashboard => "/dashboard".into(),
            Self::Chat => "/chat".into(),
            Self::Settings => "/settings".into(),
            Self::Profile => "/profile".into(),

            Self::LessonPlanner => "/lesson-planner".into(),
            Self::CreateLessonPlan => "/create-lesson-plan".into(),
            Self::EditLessonPlan(id) => format!("/lesson-plan/{}/edit", id),
            Self::LessonPlanDetail(id) => format!("/lesson-plan/{}", id),
            Self::CheckLessonPlans => "/check-lesson-plans".into(),
            Self::RejectionReasons => "/rejection-reasons".into(),

            Self::AttendanceList(scope) => scope.base_path().into(),
            Self::CreateAttendance(scope) => format!("{}/create", scope.base_path()),
            Self::TakeAttendance(scope, count) => format!("{}/take/{}", scope.base_path(), count),
            Self::ViewAttendance(scope, id) => format!("{}/view/{}", scope.base_path(), id),

            Self::ManageUsers => "/manage-users".into(),
            Self::LessonPlanReport => "/reports-lesson".into(),
            Self::AttendanceReport => "/reports-attendance".into(),

            Self::HomeworkHelper => "/homework".into(),
            Self::ParentAssistant => "/check-child".into(),

            Self::NotFound => "/404".into(),
        }
    }

    /// **核心守卫表：定义每个路由的访问要求**
    pub fn access(&self) -> RouteAccess {
        use Role::*;
        match self {
            Self::Login
            | Self::Signup
            | Self::CheckEmail
            | Self::VerifyEmail(_)
            | Self::ForgotPassword
            | Self::ResetPassword(_)
            | Self::OAuthCallback
            | Self::SetPassword
            | Self::CompleteProfile
            | Self::NotFound => RouteAccess::Public,

            Self::Dashboard | Self::Chat | Self::Settings | Self::Profile => ANY_ROLE,

            Self::LessonPlanner | Self::CreateLessonPlan | Self::EditLessonPlan(_) => {
                only(&[Teacher])
            }
            Self::LessonPlanDetail(_) => only(&[Teacher, Department, Admin]),
            Self::CheckLessonPlans => only(&[Department]),
            Self::RejectionReasons => only(&[Department, Admin]),

            Self::AttendanceList(AttendanceScope::General)
            | Self::CreateAttendance(AttendanceScope::General)
            | Self::TakeAttendance(AttendanceScope::General, _)
            | Self::ViewAttendance(AttendanceScope::General, _) => ANY_ROLE,
            Self::AttendanceList(AttendanceScope::Babysitter)
            | Self::CreateAttendance(AttendanceScope::Babysitter)
            | Self::TakeAttendance(AttendanceScope::Babysitter, _)
            | Self::ViewAttendance(AttendanceScope::Babysitter, _) => only(&[Babysitter]),

            Self::ManageUsers | Self::LessonPlanReport | Self::AttendanceReport => only(&[Admin]),

            Self::HomeworkHelper => only(&[Student]),
            Self::ParentAssistant => only(&[Parent]),
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self.access(), RouteAccess::Protected { .. })
    }

    /// 已登录用户访问这些页面时转到面板
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login | Self::Signup)
    }

    /// 登录成功后的默认落点
    pub fn auth_success_redirect() -> Self {
        Self::Dashboard
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip_through_routes() {
        let routes = [
            AppRoute::Login,
            AppRoute::Signup,
            AppRoute::VerifyEmail(Some("abc".into())),
            AppRoute::ResetPassword("tok".into()),
            AppRoute::EditLessonPlan("p1".into()),
            AppRoute::LessonPlanDetail("p1".into()),
            AppRoute::TakeAttendance(AttendanceScope::Babysitter, 12),
            AppRoute::ViewAttendance(AttendanceScope::General, "r9".into()),
            AppRoute::AttendanceList(AttendanceScope::Babysitter),
            AppRoute::ParentAssistant,
        ];
        for route in routes {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
    }

    #[test]
    fn aliases_and_unknown_paths() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/oauth-success"), AppRoute::OAuthCallback);
        assert_eq!(AppRoute::from_path("/verify/check-email"), AppRoute::CheckEmail);
        assert_eq!(AppRoute::from_path("/verify-email?token=x"), AppRoute::VerifyEmail(None));
        assert_eq!(AppRoute::from_path("/attendance/"), AppRoute::AttendanceList(AttendanceScope::General));
        assert_eq!(AppRoute::from_path("/attendance/take/abc"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/nowhere"), AppRoute::NotFound);
    }

    #[test]
    fn access_table() {
        assert_eq!(AppRoute::Login.access(), RouteAccess::Public);
        assert_eq!(AppRoute::Chat.access(), RouteAccess::Protected { roles: None });
        assert_eq!(
            AppRoute::ManageUsers.access(),
            RouteAccess::Protected { roles: Some(&[Role::Admin]) }
        );
        assert!(AppRoute::AttendanceList(AttendanceScope::Babysitter).requires_auth());
        assert!(!AppRoute::NotFound.requires_auth());
    }
}
