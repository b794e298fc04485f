//! 角色导航表
//!
//! 每个角色对应一组固定的侧边栏入口。

use crate::identity::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub to: &'static str,
    pub label: &'static str,
}

const fn link(to: &'static str, label: &'static str) -> NavLink {
    NavLink { to, label }
}

const PARENT_LINKS: &[NavLink] = &[
    link("/check-child", "AI Assistant"),
    link("/chat", "Chat"),
    link("/settings", "Settings"),
];

const TEACHER_LINKS: &[NavLink] = &[
    link("/lesson-planner", "Lesson Planner"),
    link("/chat", "Chat"),
    link("/settings", "Settings"),
];

const BABYSITTER_LINKS: &[NavLink] = &[
    link("/babysitter/attendance", "Take Attendance"),
    link("/chat", "Chat"),
    link("/settings", "Settings"),
];

const STUDENT_LINKS: &[NavLink] = &[
    link("/homework", "Homework Helper"),
    link("/chat", "Chat"),
    link("/settings", "Settings"),
];

const ADMIN_LINKS: &[NavLink] = &[
    link("/manage-users", "Manage Users"),
    link("/chat", "Chat"),
    link("/reports-lesson", "Reports of the Lesson Plan"),
    link("/reports-attendance", "Reports of the Attendance"),
    link("/settings", "Settings"),
];

const DEPARTMENT_LINKS: &[NavLink] = &[
    link("/chat", "Chat"),
    link("/settings", "Settings"),
    link("/check-lesson-plans", "Check Lesson Plans"),
    link("/rejection-reasons", "Rejection Reasons"),
];

pub fn nav_links(role: Role) -> &'static [NavLink] {
    match role {
        Role::Parent => PARENT_LINKS,
        Role::Teacher => TEACHER_LINKS,
        Role::Babysitter => BABYSITTER_LINKS,
        Role::Student => STUDENT_LINKS,
        Role::Admin => ADMIN_LINKS,
        Role::Department => DEPARTMENT_LINKS,
    }
}
