//! 路由守卫
//!
//! 会话状态的纯函数，每次渲染时求值。

use schoolhub_shared::Session;

use crate::web::route::{AppRoute, RouteAccess};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// 启动校验进行中：渲染占位，不跳转
    Loading,
    /// 未登录：跳转 `/login?from=<from>`
    RedirectToLogin { from: String },
    /// 已登录但邮箱未验证：跳转 `/check-email`
    RedirectToVerify,
    /// 角色不在允许列表中：原地显示拒绝信息，不改 URL
    RoleDenied,
    Authorized,
}

pub const CHECK_EMAIL_PATH: &str = "/check-email";

/// `requested` 为用户请求的完整路径（含查询串），登录后据此返回
pub fn evaluate(session: &Session, access: RouteAccess, requested: &str) -> GuardDecision {
    let RouteAccess::Protected { roles } = access else {
        return GuardDecision::Authorized;
    };
    if session.loading {
        return GuardDecision::Loading;
    }
    let Some(identity) = session.identity.as_ref().filter(|_| session.is_authenticated()) else {
        return GuardDecision::RedirectToLogin {
            from: requested.to_string(),
        };
    };
    if !identity.is_verified {
        return GuardDecision::RedirectToVerify;
    }
    match roles {
        Some(allowed) if !allowed.contains(&identity.role) => GuardDecision::RoleDenied,
        _ => GuardDecision::Authorized,
    }
}

/// 登录页地址，携带返回路径
pub fn login_redirect(from: &str, encode: impl Fn(&str) -> String) -> String {
    if from.is_empty() || from == "/" || from.starts_with("/login") {
        "/login".to_string()
    } else {
        format!("/login?from={}", encode(from))
    }
}

/// 登录成功后的返回路径：只接受站内路径
pub fn return_target(from: Option<String>) -> String {
    from.filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.starts_with("/login"))
        .unwrap_or_else(|| AppRoute::auth_success_redirect().to_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_shared::{Identity, Role};

    const TEACHERS: &[Role] = &[Role::Teacher];

    fn signed_in(role: Role, verified: bool) -> Session {
        let identity = Identity {
            id: "u1".into(),
            role,
            is_verified: verified,
            ..Default::default()
        };
        Session::authenticated(identity, "tok".into(), None)
    }

    #[test]
    fn public_routes_always_pass() {
        for session in [Session::restoring(), Session::signed_out(), signed_in(Role::Admin, false)] {
            assert_eq!(
                evaluate(&session, RouteAccess::Public, "/login"),
                GuardDecision::Authorized
            );
        }
    }

    #[test]
    fn loading_renders_placeholder() {
        let access = RouteAccess::Protected { roles: None };
        assert_eq!(
            evaluate(&Session::restoring(), access, "/chat"),
            GuardDecision::Loading
        );
    }

    #[test]
    fn anonymous_goes_to_login_with_return_path() {
        let access = RouteAccess::Protected { roles: Some(TEACHERS) };
        assert_eq!(
            evaluate(&Session::signed_out(), access, "/lesson-planner"),
            GuardDecision::RedirectToLogin {
                from: "/lesson-planner".into()
            }
        );

        // 只有令牌没有身份也算未登录
        let half = Session {
            access_token: Some("tok".into()),
            ..Session::signed_out()
        };
        assert!(matches!(
            evaluate(&half, access, "/x"),
            GuardDecision::RedirectToLogin { .. }
        ));
    }

    #[test]
    fn unverified_goes_to_check_email() {
        let access = RouteAccess::Protected { roles: None };
        assert_eq!(
            evaluate(&signed_in(Role::Teacher, false), access, "/chat"),
            GuardDecision::RedirectToVerify
        );
    }

    #[test]
    fn role_allow_list() {
        let access = RouteAccess::Protected { roles: Some(TEACHERS) };
        assert_eq!(
            evaluate(&signed_in(Role::Parent, true), access, "/lesson-planner"),
            GuardDecision::RoleDenied
        );
        assert_eq!(
            evaluate(&signed_in(Role::Teacher, true), access, "/lesson-planner"),
            GuardDecision::Authorized
        );
    }

    #[test]
    fn login_redirect_and_return_target() {
        let encode = |s: &str| s.replace('/', "%2F").replace('?', "%3F").replace('=', "%3D");
        assert_eq!(login_redirect("/chat", encode), "/login?from=%2Fchat");
        assert_eq!(login_redirect("/", encode), "/login");

        assert_eq!(return_target(Some("/chat".into())), "/chat");
        assert_eq!(return_target(Some("https://evil.test".into())), "/dashboard");
        assert_eq!(return_target(Some("//evil.test".into())), "/dashboard");
        assert_eq!(return_target(None), "/dashboard");
    }
}
