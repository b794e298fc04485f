//! HTTP 传输层
//!
//! `HttpClient` 只负责把请求送出去并拿回状态码和响应体文本，
//! 状态码到错误的映射由网关完成。生产环境使用 `FetchClient`（gloo-net），
//! 测试中替换为记录调用的模拟实现。

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use gloo_net::http::{Method, RequestBuilder};
use gloo_timers::callback::Timeout;
use schoolhub_shared::HttpMethod;
use web_sys::{AbortController, FormData};

use crate::error::{ApiError, ApiResult};

/// 请求体
#[derive(Debug, Clone)]
pub enum HttpBody {
    /// 已序列化的 JSON 文本
    Json(String),
    /// multipart 表单（文件上传），由浏览器设置边界
    Form(FormData),
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<HttpBody>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn json_body(&self) -> Option<&str> {
        match &self.body {
            Some(HttpBody::Json(text)) => Some(text),
            _ => None,
        }
    }
}

/// 原始响应：任何状态码都算传输成功
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait(?Send)]
pub trait HttpClient {
    /// 发送请求；只有网络失败和超时中止返回错误
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse>;
}

/// 基于 `fetch` 的客户端
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchClient;

fn method_of(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}

#[async_trait(?Send)]
impl HttpClient for FetchClient {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let controller = AbortController::new()
            .map_err(|e| ApiError::network().in_op_with("http.abort_controller", format!("{:?}", e)))?;
        let timed_out = Rc::new(Cell::new(false));

        // 计时器在本函数返回前一直存活，drop 即取消
        let _abort_guard = request.timeout.map(|limit| {
            let controller = controller.clone();
            let timed_out = timed_out.clone();
            Timeout::new(limit.as_millis() as u32, move || {
                timed_out.set(true);
                controller.abort();
            })
        });

        let signal = controller.signal();
        let mut builder = RequestBuilder::new(&request.url)
            .method(method_of(request.method))
            .abort_signal(Some(&signal));
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let built = match request.body {
            Some(HttpBody::Json(text)) => builder.body(text),
            Some(HttpBody::Form(form)) => builder.body(form),
            None => builder.build(),
        }
        .map_err(|e| ApiError::network().in_op_with("http.build", e.to_string()))?;

        let transport_error = |e: gloo_net::Error, op: &str| {
            if timed_out.get() {
                ApiError::timeout().in_op(op)
            } else {
                ApiError::network().in_op_with(op, e.to_string())
            }
        };

        let response = built
            .send()
            .await
            .map_err(|e| transport_error(e, "http.fetch"))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if timed_out.get() {
                ApiError::timeout().in_op("http.read_body")
            } else {
                ApiError::parse(e.to_string())
            }
        })?;

        Ok(HttpResponse { status, body })
    }
}
