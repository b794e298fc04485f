//! 教案表单状态
//!
//! 将零散的 signal 整合为 `FormState` 结构体，负责：
//! - 数据的持有
//! - 从已有教案或 AI 结果回填
//! - 数据到请求对象的转换

use leptos::prelude::*;
use schoolhub_shared::protocol::{GeneratedLessonPlan, UploadLessonPlanMeta};
use schoolhub_shared::{Identity, LessonPlan, LessonPlanDraft, LessonPlanKind};

/// 表单的三种录入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Manual,
    Ai,
    Upload,
}

impl EntryMode {
    pub const ALL: [EntryMode; 3] = [EntryMode::Manual, EntryMode::Ai, EntryMode::Upload];

    pub fn label(&self) -> &'static str {
        match self {
            EntryMode::Manual => "Manual",
            EntryMode::Ai => "AI Generate",
            EntryMode::Upload => "Upload File",
        }
    }
}

/// 表单状态结构体
///
/// 使用 `RwSignal` 因为它实现了 `Copy` trait，适合在子组件间传递。
#[derive(Clone, Copy)]
pub struct FormState {
    pub mode: RwSignal<EntryMode>,
    pub title: RwSignal<String>,
    pub description: RwSignal<String>,
    pub subject: RwSignal<String>,
    pub grade: RwSignal<String>,
    /// AI 生成与上传共用的主题
    pub topic: RwSignal<String>,
    /// 当前内容是否来自 AI 生成
    pub generated: RwSignal<bool>,
}

impl FormState {
    /// 新建表单，学科与年级默认取教师资料
    pub fn new(teacher: Option<&Identity>) -> Self {
        let subject = teacher.and_then(|t| t.subject.clone()).unwrap_or_default();
        let grade = teacher.and_then(|t| t.grade.clone()).unwrap_or_default();
        Self {
            mode: RwSignal::new(EntryMode::Manual),
            title: RwSignal::new(String::new()),
            description: RwSignal::new(String::new()),
            subject: RwSignal::new(subject),
            grade: RwSignal::new(grade),
            topic: RwSignal::new(String::new()),
            generated: RwSignal::new(false),
        }
    }

    /// 编辑时用已有教案回填
    pub fn fill_from_plan(&self, plan: &LessonPlan) {
        let draft = LessonPlanDraft::from_plan(plan);
        self.title.set(draft.title);
        self.description.set(draft.description);
        self.subject.set(draft.subject);
        self.grade.set(draft.grade);
        self.generated.set(draft.kind == LessonPlanKind::Ai);
    }

    /// AI 结果回填；结果中为空的学科/年级保留原值
    pub fn fill_from_generated(&self, generated: GeneratedLessonPlan) {
        let draft = generated.into_draft();
        self.title.set(draft.title);
        self.description.set(draft.description);
        if !draft.subject.trim().is_empty() {
            self.subject.set(draft.subject);
        }
        if !draft.grade.trim().is_empty() {
            self.grade.set(draft.grade);
        }
        self.generated.set(true);
    }

    /// 转换为保存请求体；缺少必填字段时返回提示
    pub fn to_draft(&self) -> Result<LessonPlanDraft, String> {
        let kind = if self.generated.get_untracked() {
            LessonPlanKind::Ai
        } else {
            LessonPlanKind::Manual
        };
        let draft = LessonPlanDraft {
            title: self.title.get_untracked().trim().to_string(),
            description: self.description.get_untracked(),
            subject: self.subject.get_untracked().trim().to_string(),
            grade: self.grade.get_untracked().trim().to_string(),
            kind,
        };
        match draft.missing_field() {
            Some(_) => Err("Please fill in all required fields.".to_string()),
            None => Ok(draft),
        }
    }

    /// 上传表单的附带字段
    pub fn to_upload_meta(&self) -> Result<UploadLessonPlanMeta, String> {
        let meta = UploadLessonPlanMeta {
            grade: self.grade.get_untracked().trim().to_string(),
            topic: self.topic.get_untracked().trim().to_string(),
            subject: self.subject.get_untracked().trim().to_string(),
        };
        if meta.fields().iter().any(|(_, v)| v.is_empty()) {
            return Err("Please provide grade, topic and subject for the upload.".to_string());
        }
        Ok(meta)
    }
}
