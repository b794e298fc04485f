//! 教案模块：教师列表/表单、详情与审核
//!
//! - `form_state`: 表单状态
//! - `list`: 教师的教案列表
//! - `form`: 新建/编辑（手动、AI、上传）
//! - `detail`: 详情页与状态迁移
//! - `review`: 审核列表与驳回理由

mod detail;
mod form;
mod form_state;
mod list;
mod review;

pub use detail::LessonPlanDetailPage;
pub use form::LessonPlanFormPage;
pub use list::LessonPlannerPage;
pub use review::{CheckLessonPlansPage, RejectionReasonsPage};

use leptos::prelude::*;
use schoolhub_shared::LessonPlanStatus;

pub(crate) const LESSON_PLANNER_PATH: &str = "/lesson-planner";

fn status_badge_class(status: LessonPlanStatus) -> &'static str {
    match status {
        LessonPlanStatus::Draft => "badge badge-ghost",
        LessonPlanStatus::Pending => "badge badge-warning",
        LessonPlanStatus::Accepted => "badge badge-success",
        LessonPlanStatus::Rejected => "badge badge-error",
    }
}

#[component]
pub(crate) fn StatusBadge(status: LessonPlanStatus) -> impl IntoView {
    view! { <span class=status_badge_class(status)>{status.label()}</span> }
}

/// 列表与卡片中的描述摘要
fn excerpt(text: &str, limit: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
