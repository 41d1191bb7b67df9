use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult, ErrorBody};
use crate::types::{LoginRequest, LoginResponse, NewTask, RegisterRequest, Task, TaskUpdate, User};

/// Typed access to the JSON API. The session cookie set by `login` is kept
/// in the client's cookie store and sent on every later request.
#[derive(Clone)]
pub struct TaskClient {
    http: Client,
    base_url: String,
}

impl TaskClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url));
        }
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(req: RequestBuilder) -> ClientResult<Response> {
        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.json::<ErrorBody>().await.unwrap_or(ErrorBody { error: String::new(), message: String::new() });
        debug!(%status, error = %body.error, "api error");
        Err(ClientError::Api { status, error: body.error, message: body.message })
    }

    async fn json<T: DeserializeOwned>(req: RequestBuilder) -> ClientResult<T> {
        Ok(Self::send(req).await?.json::<T>().await?)
    }

    /// Creates the account. Does not log in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ClientResult<User> {
        let body = RegisterRequest { name, email, password };
        Self::json(self.http.post(self.url("/auth/register")).json(&body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let body = LoginRequest { email, password };
        Self::json(self.http.post(self.url("/auth/login")).json(&body)).await
    }

    pub async fn logout(&self) -> ClientResult<()> {
        Self::send(self.http.post(self.url("/auth/logout"))).await?;
        Ok(())
    }

    pub async fn me(&self) -> ClientResult<User> {
        Self::json(self.http.get(self.url("/auth/me"))).await
    }

    pub async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
        Self::json(self.http.get(self.url("/api/tasks"))).await
    }

    pub async fn create_task(&self, input: &NewTask) -> ClientResult<Task> {
        Self::json(self.http.post(self.url("/api/tasks")).json(input)).await
    }

    pub async fn update_task(&self, id: Uuid, input: &TaskUpdate) -> ClientResult<Task> {
        Self::json(self.http.put(self.url(&format!("/api/tasks/{id}"))).json(input)).await
    }

    pub async fn delete_task(&self, id: Uuid) -> ClientResult<()> {
        Self::send(self.http.delete(self.url(&format!("/api/tasks/{id}")))).await?;
        Ok(())
    }
}
