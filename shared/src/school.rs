//! 学校固定选项与表单校验
//!
//! 注册、完善资料、教案表单共用的年级/班级/学科列表。

use crate::identity::{IdentityPatch, Role};

pub const SUBJECTS: [&str; 19] = [
    "Mathematics",
    "English",
    "Science",
    "History",
    "Geography",
    "Physics",
    "Chemistry",
    "Biology",
    "IT",
    "Art",
    "Music",
    "HPE",
    "Foreign Languages",
    "Social Studies",
    "Economics",
    "Psychology",
    "Literature",
    "Afan Oromo",
    "Amharic",
];

pub const SECTIONS: [&str; 3] = ["A", "B", "C"];

pub const GRADE_COUNT: u8 = 12;

pub const MIN_PASSWORD_LEN: usize = 8;

/// 年级选项 "1" ..= "12"
pub fn grades() -> impl Iterator<Item = String> {
    (1..=GRADE_COUNT).map(|g| g.to_string())
}

/// 某角色需要填写的附加字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleFields {
    pub grade: bool,
    pub section: bool,
    pub subject: bool,
}

impl RoleFields {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Teacher => Self {
                grade: true,
                subject: true,
                ..Self::default()
            },
            Role::Babysitter => Self {
                grade: true,
                section: true,
                ..Self::default()
            },
            Role::Department => Self {
                subject: true,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    /// 返回第一个缺失的必填字段名
    pub fn missing(&self, grade: &str, section: &str, subject: &str) -> Option<&'static str> {
        [
            (self.grade, "grade", grade),
            (self.section, "section", section),
            (self.subject, "subject", subject),
        ]
        .into_iter()
        .find(|(needed, _, value)| *needed && value.trim().is_empty())
        .map(|(_, name, _)| name)
    }

    /// 只保留该角色用到的字段
    pub fn patch(&self, role: Role, grade: &str, section: &str, subject: &str) -> IdentityPatch {
        let keep = |needed: bool, value: &str| {
            (needed && !value.trim().is_empty()).then(|| value.trim().to_string())
        };
        IdentityPatch {
            role: Some(role),
            grade: keep(self.grade, grade),
            section: keep(self.section, section),
            subject: keep(self.subject, subject),
            ..IdentityPatch::default()
        }
    }
}

/// 新密码校验：长度与两次输入一致
pub fn validate_new_password(password: &str, confirm: Option<&str>) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }
    if confirm.is_some_and(|c| c != password) {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_fields_follow_role() {
        assert_eq!(
            RoleFields::for_role(Role::Teacher),
            RoleFields { grade: true, section: false, subject: true }
        );
        assert_eq!(
            RoleFields::for_role(Role::Babysitter),
            RoleFields { grade: true, section: true, subject: false }
        );
        assert_eq!(RoleFields::for_role(Role::Parent), RoleFields::default());
    }

    #[test]
    fn missing_reports_first_required_blank() {
        let teacher = RoleFields::for_role(Role::Teacher);
        assert_eq!(teacher.missing("", "", ""), Some("grade"));
        assert_eq!(teacher.missing("5", "", " "), Some("subject"));
        assert_eq!(teacher.missing("5", "", "Art"), None);
        assert_eq!(RoleFields::default().missing("", "", ""), None);
    }

    #[test]
    fn patch_drops_fields_the_role_does_not_use() {
        let patch = RoleFields::for_role(Role::Department).patch(Role::Department, "7", "B", "IT");
        assert_eq!(patch.role, Some(Role::Department));
        assert_eq!(patch.grade, None);
        assert_eq!(patch.section, None);
        assert_eq!(patch.subject.as_deref(), Some("IT"));
    }

    #[test]
    fn password_rules() {
        assert!(validate_new_password("short", None).is_err());
        assert!(validate_new_password("long enough", Some("different")).is_err());
        assert!(validate_new_password("long enough", Some("long enough")).is_ok());
        assert_eq!(grades().count(), 12);
    }
}
