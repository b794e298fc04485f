//! 教案模型与状态机
//!
//! 状态迁移只在这里定义。客户端从不乐观地修改状态：
//! 调用迁移接口后一律展示服务端返回的教案。

use crate::identity::Role;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

// =========================================================
// 状态与动作
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonPlanStatus {
    #[default]
    Draft,
    Pending,
    Accepted,
    Rejected,
}

impl LessonPlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonPlanStatus::Draft => "draft",
            LessonPlanStatus::Pending => "pending",
            LessonPlanStatus::Accepted => "accepted",
            LessonPlanStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LessonPlanStatus::Draft => "Draft",
            LessonPlanStatus::Pending => "Pending",
            LessonPlanStatus::Accepted => "Accepted",
            LessonPlanStatus::Rejected => "Rejected",
        }
    }

    /// 计算迁移后的状态，非法迁移返回错误
    pub fn next(self, action: PlanAction) -> Result<LessonPlanStatus, TransitionError> {
        use LessonPlanStatus::*;
        match (action, self) {
            (PlanAction::Submit, Draft | Rejected) => Ok(Pending),
            (PlanAction::Accept, Pending | Rejected) => Ok(Accepted),
            (PlanAction::Reject, Pending | Accepted) => Ok(Rejected),
            (action, from) => Err(TransitionError { from, action }),
        }
    }
}

impl Display for LessonPlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanAction {
    /// 作者提交审核
    Submit,
    /// 审核人通过
    Accept,
    /// 审核人驳回（需要理由）
    Reject,
}

impl PlanAction {
    pub fn label(&self) -> &'static str {
        match self {
            PlanAction::Submit => "Submit",
            PlanAction::Accept => "Accept",
            PlanAction::Reject => "Reject",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: LessonPlanStatus,
    pub action: PlanAction,
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot {} a lesson plan that is {}",
            self.action.label().to_lowercase(),
            self.from.as_str()
        )
    }
}

impl std::error::Error for TransitionError {}

/// 某角色在当前状态下可执行的动作（决定页面上显示哪些按钮）
pub fn available_actions(role: Role, status: LessonPlanStatus) -> Vec<PlanAction> {
    let candidates: &[PlanAction] = match role {
        Role::Teacher => &[PlanAction::Submit],
        Role::Department => &[PlanAction::Accept, PlanAction::Reject],
        _ => &[],
    };
    candidates
        .iter()
        .copied()
        .filter(|action| status.next(*action).is_ok())
        .collect()
}

// =========================================================
// 教案
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonPlanKind {
    #[default]
    Manual,
    Ai,
    Uploaded,
}

impl LessonPlanKind {
    pub fn label(&self) -> &'static str {
        match self {
            LessonPlanKind::Manual => "Manual",
            LessonPlanKind::Ai => "AI",
            LessonPlanKind::Uploaded => "Uploaded",
        }
    }
}

/// 作者信息：接口可能返回展开的对象，也可能只返回 id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TeacherRef {
    Summary {
        #[serde(rename = "fullName", default)]
        full_name: String,
        #[serde(default)]
        email: String,
    },
    Id(String),
}

impl TeacherRef {
    pub fn name(&self) -> &str {
        match self {
            TeacherRef::Summary { full_name, .. } if !full_name.is_empty() => full_name,
            _ => "Unknown",
        }
    }

    pub fn email(&self) -> &str {
        match self {
            TeacherRef::Summary { email, .. } if !email.is_empty() => email,
            _ => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub teacher: Option<TeacherRef>,
    #[serde(rename = "type", default)]
    pub kind: LessonPlanKind,
    #[serde(default)]
    pub status: LessonPlanStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub highlighted_text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl LessonPlan {
    pub fn teacher_name(&self) -> &str {
        self.teacher.as_ref().map(TeacherRef::name).unwrap_or("Unknown")
    }

    pub fn teacher_email(&self) -> &str {
        self.teacher.as_ref().map(TeacherRef::email).unwrap_or("Unknown")
    }
}

/// 新建/编辑表单提交的字段
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LessonPlanDraft {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub grade: String,
    #[serde(rename = "type")]
    pub kind: LessonPlanKind,
}

impl LessonPlanDraft {
    pub fn from_plan(plan: &LessonPlan) -> Self {
        Self {
            title: plan.title.clone(),
            description: plan.description.clone(),
            subject: plan.subject.clone(),
            grade: plan.grade.clone(),
            kind: plan.kind,
        }
    }

    /// 返回第一个为空的必填字段名
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("subject", &self.subject),
            ("grade", &self.grade),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
    }
}

// =========================================================
// 驳回理由
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionStatus {
    #[default]
    Active,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionReason {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub lesson_plan_id: String,
    #[serde(default)]
    pub lesson_plan_title: String,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub teacher_email: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub highlighted_text: Option<String>,
    #[serde(default)]
    pub status: RejectionStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use LessonPlanStatus::*;

    #[test]
    fn transition_table() {
        assert_eq!(Draft.next(PlanAction::Submit), Ok(Pending));
        assert_eq!(Rejected.next(PlanAction::Submit), Ok(Pending));
        assert!(Pending.next(PlanAction::Submit).is_err());
        assert!(Accepted.next(PlanAction::Submit).is_err());

        assert_eq!(Pending.next(PlanAction::Accept), Ok(Accepted));
        assert_eq!(Rejected.next(PlanAction::Accept), Ok(Accepted));
        assert!(Draft.next(PlanAction::Accept).is_err());

        assert_eq!(Pending.next(PlanAction::Reject), Ok(Rejected));
        assert_eq!(Accepted.next(PlanAction::Reject), Ok(Rejected));
        assert!(Draft.next(PlanAction::Reject).is_err());
        assert!(Rejected.next(PlanAction::Reject).is_err());
    }

    #[test]
    fn fractions_intro_walkthrough() {
        let json = r#"{"_id":"lp1","title":"Fractions Intro","subject":"Math","grade":"5","type":"manual","status":"draft"}"#;
        let mut plan: LessonPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.status, Draft);

        plan.status = plan.status.next(PlanAction::Submit).unwrap();
        assert_eq!(plan.status, Pending);

        plan.status = plan.status.next(PlanAction::Reject).unwrap();
        plan.rejection_reason = Some("Needs worked examples".into());
        plan.highlighted_text = Some("1/2 + 1/3".into());
        assert_eq!(plan.status, Rejected);

        plan.status = plan.status.next(PlanAction::Submit).unwrap();
        assert_eq!(plan.status, Pending);
        assert_eq!(plan.rejection_reason.as_deref(), Some("Needs worked examples"));
    }

    #[test]
    fn actions_by_role() {
        assert_eq!(available_actions(Role::Teacher, Draft), vec![PlanAction::Submit]);
        assert!(available_actions(Role::Teacher, Pending).is_empty());
        assert_eq!(
            available_actions(Role::Department, Pending),
            vec![PlanAction::Accept, PlanAction::Reject]
        );
        assert_eq!(available_actions(Role::Department, Accepted), vec![PlanAction::Reject]);
        assert_eq!(available_actions(Role::Department, Rejected), vec![PlanAction::Accept]);
        for status in [Draft, Pending, Accepted, Rejected] {
            assert!(available_actions(Role::Admin, status).is_empty());
        }
    }

    #[test]
    fn teacher_may_be_object_id_or_null() {
        let p: LessonPlan =
            serde_json::from_str(r#"{"_id":"a","teacher":{"fullName":"T","email":"t@x"}}"#).unwrap();
        assert_eq!(p.teacher_name(), "T");
        let p: LessonPlan = serde_json::from_str(r#"{"_id":"a","teacher":"t1"}"#).unwrap();
        assert_eq!(p.teacher_name(), "Unknown");
        let p: LessonPlan = serde_json::from_str(r#"{"_id":"a","teacher":null}"#).unwrap();
        assert_eq!(p.teacher_email(), "Unknown");
    }

    #[test]
    fn draft_validation() {
        let mut d = LessonPlanDraft {
            title: "Fractions Intro".into(),
            ..Default::default()
        };
        assert_eq!(d.missing_field(), Some("description"));
        d.description = "x".into();
        d.subject = "Math".into();
        d.grade = "5".into();
        assert_eq!(d.missing_field(), None);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "manual");
    }

    #[test]
    fn transition_error_message() {
        let err = Draft.next(PlanAction::Accept).unwrap_err();
        assert_eq!(err.to_string(), "cannot accept a lesson plan that is draft");
    }
}
