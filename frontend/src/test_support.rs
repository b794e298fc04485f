//! 测试用的模拟实现

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use schoolhub_shared::{ClientEvent, Identity, Role};

use crate::chat::ChannelSink;
use crate::error::{ApiError, ApiResult};
use crate::session::Navigator;
use crate::web::http::{HttpClient, HttpRequest, HttpResponse};

pub const BASE_URL: &str = "https://api.school.test/api";

/// 按顺序返回预设响应，并记录收到的请求
#[derive(Clone, Default)]
pub struct MockHttp {
    responses: Rc<RefCell<VecDeque<ApiResult<HttpResponse>>>>,
    requests: Rc<RefCell<Vec<HttpRequest>>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: &str) -> &Self {
        self.responses
            .borrow_mut()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(&self, error: ApiError) -> &Self {
        self.responses.borrow_mut().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .borrow()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait(?Send)]
impl HttpClient for MockHttp {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::network()))
    }
}

#[derive(Clone, Default)]
pub struct MockNavigator {
    redirects: Rc<RefCell<Vec<String>>>,
}

impl MockNavigator {
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.borrow().clone()
    }
}

impl Navigator for MockNavigator {
    fn hard_redirect(&self, path: &str) {
        self.redirects.borrow_mut().push(path.to_string());
    }
}

#[derive(Clone, Default)]
pub struct MockSink {
    events: Rc<RefCell<Vec<ClientEvent>>>,
}

impl MockSink {
    pub fn events(&self) -> Vec<ClientEvent> {
        self.events.borrow().clone()
    }
}

impl ChannelSink for MockSink {
    fn emit(&self, event: &ClientEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

pub fn identity(id: &str, role: Role) -> Identity {
    Identity {
        id: id.to_string(),
        full_name: format!("User {id}"),
        email: format!("{id}@school.test"),
        role,
        is_verified: true,
        ..Default::default()
    }
}

pub fn user_json(id: &str, role: Role) -> String {
    serde_json::to_string(&identity(id, role)).expect("identity serializes")
}
