//! 身份与会话模型
//!
//! 后端在不同端点返回的用户字段并不统一（`_id`/`id`、`name`/`fullName`、
//! `avatar`/`profilePicture`），反序列化时先读入宽松结构再归一。

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

// =========================================================
// Role
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Parent,
    Babysitter,
    Admin,
    Department,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Student,
        Role::Teacher,
        Role::Parent,
        Role::Babysitter,
        Role::Admin,
        Role::Department,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Parent => "Parent",
            Role::Babysitter => "Babysitter",
            Role::Admin => "Admin",
            Role::Department => "Department",
        }
    }

    /// 未知角色回退为 Student
    pub fn parse(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Role::parse(&s)).unwrap_or_default())
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =========================================================
// Identity
// =========================================================

/// 已认证用户的资料快照
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "IdentityWire")]
pub struct Identity {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    #[serde(rename = "profilePicture", skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(rename = "isOAuth")]
    pub is_oauth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// 反序列化用的宽松结构：同一字段的两种拼写可能同时出现
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityWire {
    #[serde(rename = "_id")]
    underscore_id: Option<String>,
    id: Option<String>,
    full_name: Option<String>,
    name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    role: Role,
    is_verified: Option<bool>,
    profile_picture: Option<String>,
    avatar: Option<String>,
    #[serde(rename = "isOAuth")]
    is_oauth: Option<bool>,
    has_password: Option<bool>,
    grade: Option<String>,
    section: Option<String>,
    subject: Option<String>,
    created_at: Option<String>,
}

fn first_non_empty(a: Option<String>, b: Option<String>) -> Option<String> {
    a.filter(|s| !s.is_empty()).or(b.filter(|s| !s.is_empty()))
}

impl From<IdentityWire> for Identity {
    fn from(w: IdentityWire) -> Self {
        Self {
            id: first_non_empty(w.underscore_id, w.id).unwrap_or_default(),
            full_name: first_non_empty(w.full_name, w.name).unwrap_or_default(),
            email: w.email.unwrap_or_default(),
            role: w.role,
            is_verified: w.is_verified.unwrap_or(false),
            avatar: first_non_empty(w.profile_picture, w.avatar),
            is_oauth: w.is_oauth.unwrap_or(false),
            has_password: w.has_password,
            grade: w.grade,
            section: w.section,
            subject: w.subject,
            created_at: w.created_at,
        }
    }
}

impl Identity {
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            "User"
        } else {
            &self.full_name
        }
    }

    pub fn initial(&self) -> String {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default()
    }
}

/// 资料更新请求（只携带需要修改的字段）
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

// =========================================================
// Session
// =========================================================

/// 当前标签页的会话状态
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: Option<Identity>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// 启动时的令牌校验是否仍在进行
    pub loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::restoring()
    }
}

impl Session {
    /// 启动校验尚未完成的初始状态
    pub fn restoring() -> Self {
        Self {
            identity: None,
            access_token: None,
            refresh_token: None,
            loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            loading: false,
            ..Self::restoring()
        }
    }

    pub fn authenticated(identity: Identity, access: String, refresh: Option<String>) -> Self {
        Self {
            identity: Some(identity),
            access_token: Some(access),
            refresh_token: refresh,
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some() && self.access_token.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|i| i.role)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_accepts_both_field_spellings() {
        let a: Identity = serde_json::from_str(
            r#"{"_id":"u1","fullName":"Ada","email":"a@x.io","role":"Teacher","isVerified":true,"profilePicture":"p.png"}"#,
        )
        .unwrap();
        let b: Identity = serde_json::from_str(
            r#"{"id":"u1","name":"Ada","email":"a@x.io","role":"Teacher","isVerified":true,"avatar":"p.png"}"#,
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.role, Role::Teacher);
        assert_eq!(a.avatar.as_deref(), Some("p.png"));
    }

    #[test]
    fn both_spellings_at_once_are_merged() {
        let i: Identity = serde_json::from_str(
            r#"{"_id":"u1","id":"u1","name":"","fullName":"Ada","avatar":"","profilePicture":"p.png"}"#,
        )
        .unwrap();
        assert_eq!(i.id, "u1");
        assert_eq!(i.full_name, "Ada");
        assert_eq!(i.avatar.as_deref(), Some("p.png"));

        // 序列化后再读回保持一致（持久化存储的往返）
        let stored = serde_json::to_string(&i).unwrap();
        let back: Identity = serde_json::from_str(&stored).unwrap();
        assert_eq!(back, i);
    }

    #[test]
    fn unknown_or_missing_role_falls_back_to_student() {
        let i: Identity = serde_json::from_str(r#"{"_id":"u","role":"Principal"}"#).unwrap();
        assert_eq!(i.role, Role::Student);
        let i: Identity = serde_json::from_str(r#"{"_id":"u","role":null}"#).unwrap();
        assert_eq!(i.role, Role::Student);
        assert_eq!(Role::parse("department"), Role::Department);
    }

    #[test]
    fn authenticated_requires_identity_and_token() {
        let identity = Identity {
            id: "u1".into(),
            ..Default::default()
        };
        assert!(!Session::signed_out().is_authenticated());

        let only_identity = Session {
            identity: Some(identity.clone()),
            ..Session::signed_out()
        };
        assert!(!only_identity.is_authenticated());

        let only_token = Session {
            access_token: Some("t".into()),
            ..Session::signed_out()
        };
        assert!(!only_token.is_authenticated());

        assert!(Session::authenticated(identity, "t".into(), None).is_authenticated());
    }

    #[test]
    fn display_name_has_fallback() {
        let mut i = Identity::default();
        assert_eq!(i.display_name(), "User");
        assert_eq!(i.initial(), "U");
        i.full_name = "grace".into();
        assert_eq!(i.initial(), "G");
    }
}
