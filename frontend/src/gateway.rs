//! 请求网关
//!
//! 所有 REST 调用的唯一出口：拼接地址、附加 `Content-Type` 与
//! `Authorization: Bearer` 头、设置中止时限、解析 JSON，
//! 并把非 2xx 状态统一映射为 [`ApiError`]。
//! 带令牌的调用收到 401 时触发注入的钩子（清空会话并跳转登录页）。

use std::rc::Rc;
use std::time::Duration;

use schoolhub_shared::{ApiRequest, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE, HttpMethod};
use serde::Serialize;
use serde::de::DeserializeOwned;
use web_sys::FormData;

use crate::error::{ApiError, ApiResult};
use crate::web::http::{HttpBody, HttpClient, HttpRequest, HttpResponse};

const JSON_CONTENT_TYPE: &str = "application/json";

pub struct Gateway<C> {
    client: C,
    base_url: String,
    on_unauthorized: Option<Rc<dyn Fn()>>,
}

impl<C: HttpClient> Gateway<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            on_unauthorized: None,
        }
    }

    /// 注入 401 钩子
    pub fn with_unauthorized_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.on_unauthorized = Some(Rc::new(hook));
        self
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 发起一次端点调用
    pub async fn call<R: ApiRequest>(&self, request: &R, token: Option<&str>) -> ApiResult<R::Response> {
        self.execute(request, token, true).await
    }

    /// 与 `call` 相同，但 401 不触发钩子（启动时的令牌校验自行处理失败）
    pub async fn call_quietly<R: ApiRequest>(
        &self,
        request: &R,
        token: Option<&str>,
    ) -> ApiResult<R::Response> {
        self.execute(request, token, false).await
    }

    async fn execute<R: ApiRequest>(
        &self,
        request: &R,
        token: Option<&str>,
        notify_unauthorized: bool,
    ) -> ApiResult<R::Response> {
        let path = request.path();
        let mut http = HttpRequest::new(R::METHOD, self.url(&path));
        http.query = request
            .query()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        http.timeout = request.timeout();

        if R::AUTH {
            let token = token.ok_or_else(|| ApiError::not_authenticated().in_op(path.clone()))?;
            http = http.header(HEADER_AUTHORIZATION, &bearer(token));
        }
        if R::METHOD.has_body() {
            let body = encode_body(request).map_err(|e| e.in_op(path.clone()))?;
            http = http.header(HEADER_CONTENT_TYPE, JSON_CONTENT_TYPE);
            http.body = Some(HttpBody::Json(body));
        }

        let response = self
            .dispatch(http, R::AUTH && notify_unauthorized)
            .await
            .map_err(|e| e.in_op(path.clone()))?;
        decode::<R::Response>(&response.body).map_err(|e| e.in_op(path))
    }

    /// multipart 上传，状态映射与 `call` 一致
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        form: FormData,
        token: Option<&str>,
        timeout: Option<Duration>,
    ) -> ApiResult<T> {
        let token = token.ok_or_else(|| ApiError::not_authenticated().in_op(path))?;
        let mut http = HttpRequest::new(HttpMethod::Post, self.url(path))
            .header(HEADER_AUTHORIZATION, &bearer(token));
        http.body = Some(HttpBody::Form(form));
        http.timeout = timeout;

        let response = self.dispatch(http, true).await.map_err(|e| e.in_op(path))?;
        decode(&response.body).map_err(|e| e.in_op(path))
    }

    async fn dispatch(&self, request: HttpRequest, notify_unauthorized: bool) -> ApiResult<HttpResponse> {
        log::debug!("{} {}", request.method.as_str(), request.url);
        let response = self.client.send(request).await?;
        if response.ok() {
            return Ok(response);
        }

        if response.status == 401 && notify_unauthorized {
            if let Some(hook) = &self.on_unauthorized {
                log::warn!("access token rejected, signing out");
                hook();
            }
        }
        Err(ApiError::from_response(response.status, &response.body))
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// 无字段的请求体序列化为 `{}`
fn encode_body<R: Serialize>(request: &R) -> ApiResult<String> {
    let value = serde_json::to_value(request)
        .map_err(|e| ApiError::rejected("Invalid request").in_op_with("request.encode", e.to_string()))?;
    if value.is_null() {
        Ok("{}".to_string())
    } else {
        Ok(value.to_string())
    }
}

/// 解析响应体；空响应体按 `null` 处理，只有能接受 `null` 的类型才会成功
pub fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    if body.trim().is_empty() {
        return serde_json::from_str("null").map_err(|_| ApiError::empty_body());
    }
    serde_json::from_str(body).map_err(|e| ApiError::parse(e.to_string()))
}

#[cfg(test)]
mod tests;
