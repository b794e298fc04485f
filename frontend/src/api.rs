//! 业务接口
//!
//! 大多数页面直接用 [`Api::call`] 调用 `shared::protocol` 中的端点；
//! 这里只放有额外规则的调用：作业助手的单次重试、教案上传、教案状态迁移。

use std::rc::Rc;

use leptos::prelude::*;
use schoolhub_shared::protocol::{
    AcceptLessonPlanRequest, DepartmentLessonPlanRequest, HomeworkChatRequest,
    LessonPlanEnvelope, ParentAssistantRequest, RejectLessonPlanRequest, SubmitLessonPlanRequest,
    TeacherLessonPlanRequest, UPLOAD_LESSON_PLAN_PATH, UploadLessonPlanMeta, timeouts,
};
use schoolhub_shared::{ApiRequest, LessonPlan, PlanAction, Role};
use web_sys::{File, FormData};

use crate::error::{ApiError, ApiErrorStatus, ApiResult};
use crate::gateway::Gateway;
use crate::web::http::{FetchClient, HttpClient};

pub struct Api<C = FetchClient> {
    gateway: Rc<Gateway<C>>,
}

impl<C> Clone for Api<C> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

/// 教案状态迁移命令
#[derive(Debug, Clone, PartialEq)]
pub enum PlanCommand {
    Submit,
    Accept,
    Reject {
        reason: String,
        highlighted_text: Option<String>,
    },
}

impl PlanCommand {
    pub fn action(&self) -> PlanAction {
        match self {
            PlanCommand::Submit => PlanAction::Submit,
            PlanCommand::Accept => PlanAction::Accept,
            PlanCommand::Reject { .. } => PlanAction::Reject,
        }
    }
}

/// 迁移结果：`plan` 为应当展示的服务端状态，`error` 为需要内联显示的错误
#[derive(Debug, Default)]
pub struct PlanActionOutcome {
    pub plan: Option<LessonPlan>,
    pub error: Option<ApiError>,
}

impl<C: HttpClient> Api<C> {
    pub fn new(gateway: Rc<Gateway<C>>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Rc<Gateway<C>> {
        &self.gateway
    }

    pub async fn call<R: ApiRequest>(&self, request: &R, token: Option<&str>) -> ApiResult<R::Response> {
        self.gateway.call(request, token).await
    }

    /// 作业助手：解析失败时静默重试一次，空响应体不重试
    pub async fn homework_chat(&self, question: &str, token: Option<&str>) -> ApiResult<Option<String>> {
        let request = HomeworkChatRequest {
            question: question.to_string(),
        };
        match self.call(&request, token).await {
            Ok(response) => Ok(response.answer),
            Err(e) if e.is(ApiErrorStatus::Parse) && !e.is_empty_body() => {
                log::info!("homework answer unreadable, retrying once: {}", e);
                self.call(&request, token).await.map(|r| r.answer)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn parent_assistant(&self, question: &str, token: Option<&str>) -> ApiResult<Option<String>> {
        let request = ParentAssistantRequest {
            question: question.to_string(),
        };
        self.call(&request, token).await.map(|r| r.answer)
    }

    /// 上传教案文件（multipart：file、grade、topic、subject）
    pub async fn upload_lesson_plan(
        &self,
        file: &File,
        meta: &UploadLessonPlanMeta,
        token: Option<&str>,
    ) -> ApiResult<LessonPlan> {
        let form = upload_form(file, meta).map_err(|e| e.in_op(UPLOAD_LESSON_PLAN_PATH))?;
        self.gateway
            .upload::<LessonPlanEnvelope>(
                UPLOAD_LESSON_PLAN_PATH,
                form,
                token,
                Some(timeouts::FILE_UPLOAD),
            )
            .await
            .map(LessonPlanEnvelope::into_plan)
    }

    /// 按查看者角色选择详情端点
    pub async fn lesson_plan(&self, id: &str, viewer: Role, token: Option<&str>) -> ApiResult<LessonPlan> {
        let id = id.to_string();
        let envelope = match viewer {
            Role::Teacher => self.call(&TeacherLessonPlanRequest { id }, token).await?,
            _ => self.call(&DepartmentLessonPlanRequest { id }, token).await?,
        };
        Ok(envelope.into_plan())
    }

    /// 执行一次状态迁移
    ///
    /// 从不乐观地修改状态。成功时展示服务端返回的教案（返回体不完整时重新拉取），
    /// 失败时重新拉取并展示拉取到的状态，同时带回错误。
    pub async fn apply_plan_action(
        &self,
        id: &str,
        command: PlanCommand,
        viewer: Role,
        token: Option<&str>,
    ) -> PlanActionOutcome {
        let result = match command {
            PlanCommand::Submit => {
                self.call(&SubmitLessonPlanRequest { id: id.to_string() }, token)
                    .await
            }
            PlanCommand::Accept => {
                self.call(&AcceptLessonPlanRequest { id: id.to_string() }, token)
                    .await
            }
            PlanCommand::Reject {
                reason,
                highlighted_text,
            } => {
                let reason = reason.trim().to_string();
                if reason.is_empty() {
                    return PlanActionOutcome {
                        plan: None,
                        error: Some(ApiError::rejected("Please provide a reason for rejection")),
                    };
                }
                let request = RejectLessonPlanRequest {
                    id: id.to_string(),
                    reason,
                    highlighted_text: highlighted_text.filter(|t| !t.trim().is_empty()),
                };
                self.call(&request, token).await
            }
        };

        match result.map(LessonPlanEnvelope::into_plan) {
            Ok(plan) if !plan.id.is_empty() => PlanActionOutcome {
                plan: Some(plan),
                error: None,
            },
            Ok(_) => PlanActionOutcome {
                plan: self.refetch(id, viewer, token).await,
                error: None,
            },
            Err(e) => {
                log::warn!("lesson plan transition failed: {}", e);
                PlanActionOutcome {
                    plan: self.refetch(id, viewer, token).await,
                    error: Some(e),
                }
            }
        }
    }

    async fn refetch(&self, id: &str, viewer: Role, token: Option<&str>) -> Option<LessonPlan> {
        match self.lesson_plan(id, viewer, token).await {
            Ok(plan) => Some(plan),
            Err(e) => {
                log::warn!("failed to reload lesson plan {}: {}", id, e);
                None
            }
        }
    }
}

fn upload_form(file: &File, meta: &UploadLessonPlanMeta) -> ApiResult<FormData> {
    let js_err = |e: wasm_bindgen::JsValue| {
        ApiError::rejected("Could not prepare the upload")
            .in_op_with("upload.form", format!("{:?}", e))
    };
    let form = FormData::new().map_err(js_err)?;
    form.append_with_blob_and_filename("file", file, &file.name())
        .map_err(js_err)?;
    for (key, value) in meta.fields() {
        form.append_with_str(key, value).map_err(js_err)?;
    }
    Ok(form)
}

// =========================================================
// Leptos 上下文
// =========================================================

pub fn provide_api(api: Api) {
    provide_context(StoredValue::new_local(api));
}

/// 从 Context 获取接口
pub fn use_api() -> Api {
    use_api_handle().get_value()
}

/// 可 Copy 的接口句柄，供需要 `Send` 的回调捕获
pub fn use_api_handle() -> StoredValue<Api, LocalStorage> {
    use_context::<StoredValue<Api, LocalStorage>>().expect("Api should be provided")
}

#[cfg(test)]
mod tests;
