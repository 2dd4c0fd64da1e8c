//! Scripted transport and wiring shared by the unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::oneshot;

use crate::api::client::ApiClient;
use crate::api::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::errors::ClientError;
use crate::navigation::LoginRedirect;
use crate::session::SessionStore;
use crate::storage::MemoryStorage;

pub(crate) fn ok_response(data: serde_json::Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: json!({ "code": 0, "message": "success", "data": data }).to_string(),
    }
}

pub(crate) fn code_response(code: i64, message: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: json!({ "code": code, "message": message, "data": null }).to_string(),
    }
}

enum Reply {
    Respond(HttpResponse),
    Fail(String),
    Wait(oneshot::Receiver<HttpResponse>),
}

/// Answers each path from its own queue of scripted replies, in order.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: RefCell<HashMap<String, VecDeque<Reply>>>,
    sent: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn push(&self, path: &str, reply: Reply) {
        self.replies
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn reply(&self, path: &str, response: HttpResponse) {
        self.push(path, Reply::Respond(response));
    }

    pub(crate) fn reply_code(&self, path: &str, code: i64, message: &str) {
        self.reply(path, code_response(code, message));
    }

    pub(crate) fn fail(&self, path: &str, message: &str) {
        self.push(path, Reply::Fail(message.to_string()));
    }

    /// The request for `path` stays pending until the sender fires.
    pub(crate) fn defer(&self, path: &str) -> oneshot::Sender<HttpResponse> {
        let (tx, rx) = oneshot::channel();
        self.push(path, Reply::Wait(rx));
        tx
    }

    pub(crate) fn calls(&self, path: &str) -> usize {
        self.sent.borrow().iter().filter(|r| r.path == path).count()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|r| r.path.clone()).collect()
    }

    pub(crate) fn last_request(&self, path: &str) -> HttpRequest {
        self.sent
            .borrow()
            .iter()
            .rev()
            .find(|r| r.path == path)
            .cloned()
            .unwrap_or_else(|| panic!("no request sent to {path}"))
    }
}

#[async_trait(?Send)]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let path = request.path.clone();
        self.sent.borrow_mut().push(request);
        let reply = self
            .replies
            .borrow_mut()
            .get_mut(&path)
            .and_then(|queue| queue.pop_front());
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(ClientError::transport(message)),
            Some(Reply::Wait(rx)) => rx
                .await
                .map_err(|_| ClientError::transport("deferred reply dropped")),
            None => Err(ClientError::transport(format!("no scripted reply for {path}"))),
        }
    }
}

pub(crate) struct Harness {
    pub transport: Rc<ScriptedTransport>,
    pub storage: Rc<MemoryStorage>,
    pub session: Rc<SessionStore>,
    pub navigator: Rc<LoginRedirect>,
    pub api: Rc<ApiClient>,
}

impl Harness {
    pub(crate) fn logged_out() -> Self {
        let transport = Rc::new(ScriptedTransport::default());
        let storage = Rc::new(MemoryStorage::new());
        let session = Rc::new(SessionStore::load(storage.clone()));
        let navigator = Rc::new(LoginRedirect::new());
        let api = Rc::new(ApiClient::new(transport.clone(), session.clone(), navigator.clone()));
        Self { transport, storage, session, navigator, api }
    }

    pub(crate) fn logged_in(token: &str, username: &str) -> Self {
        let harness = Self::logged_out();
        harness
            .session
            .set_session(token, username)
            .expect("memory storage never fails");
        harness
    }
}
