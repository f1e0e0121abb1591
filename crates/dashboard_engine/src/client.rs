use std::fmt;
use std::time::Duration;

use dashboard_core::{
    ApplicationId, BackgroundTaskLog, Contact, JobApplication, Resume,
};
use engine_logging::{engine_debug, engine_trace};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::dispatch::MailDispatch;
use crate::{Accepted, ApiError};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientSettings {
    /// Endpoint paths are joined relative to `base_url`, so a trailing slash is
    /// enforced to keep any path prefix.
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Credentials for the current session. Built once and handed to the client.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

#[async_trait::async_trait]
pub trait DashboardApi: Send + Sync {
    async fn list_applications(&self) -> Result<Vec<JobApplication>, ApiError>;

    async fn update_application_status(
        &self,
        application_id: ApplicationId,
        status: &str,
    ) -> Result<Accepted, ApiError>;

    async fn auto_apply(&self, application_id: ApplicationId) -> Result<Accepted, ApiError>;

    async fn sync_inbox(&self) -> Result<Accepted, ApiError>;

    async fn list_logs(&self, running_only: bool) -> Result<Vec<BackgroundTaskLog>, ApiError>;

    async fn running_count(&self) -> Result<u32, ApiError>;

    async fn stop_all_tasks(&self) -> Result<Accepted, ApiError>;

    async fn dispatch_mail(&self, request: &MailDispatch) -> Result<Accepted, ApiError>;

    async fn list_contacts(&self) -> Result<Vec<Contact>, ApiError>;

    async fn list_scraped_contacts(&self) -> Result<Vec<Contact>, ApiError>;

    async fn list_resumes(&self) -> Result<Vec<Resume>, ApiError>;

    async fn run_scraper(&self, target_url: &str, target_type: &str)
        -> Result<Accepted, ApiError>;

    async fn stop_scraper(&self) -> Result<Accepted, ApiError>;
}

/// List endpoints answer either with a bare array or a paged envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Paged { items: Vec<T> },
}

impl<T> ListBody<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) | ListBody::Paged { items } => items,
        }
    }
}

#[derive(Deserialize)]
struct CountBody {
    #[serde(default)]
    count: u32,
}

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a str,
}

#[derive(Serialize)]
struct ScraperRunBody<'a> {
    target_url: &'a str,
    target_type: &'a str,
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    client: reqwest::Client,
    settings: ClientSettings,
    session: Session,
}

impl ReqwestApi {
    pub fn new(settings: ClientSettings, session: Session) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            settings,
            session,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.settings
            .base_url
            .join(path)
            .map_err(|err| ApiError::InvalidUrl(format!("{path}: {err}")))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(path)?;
        engine_trace!("{} {}", method, url);
        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, self.session.authorization());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Application {
                status: status.as_u16(),
                detail: extract_detail(status, &text),
            });
        }
        Ok(text)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let text = self.send::<()>(Method::GET, path, None).await?;
        serde_json::from_str(&text).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        self.get_json::<ListBody<T>>(path)
            .await
            .map(ListBody::into_items)
    }

    async fn post_accepted<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Accepted, ApiError> {
        let text = self.send(method, path, body).await?;
        Ok(parse_accepted(&text))
    }
}

#[async_trait::async_trait]
impl DashboardApi for ReqwestApi {
    async fn list_applications(&self) -> Result<Vec<JobApplication>, ApiError> {
        self.get_list("api/v1/applications/").await
    }

    async fn update_application_status(
        &self,
        application_id: ApplicationId,
        status: &str,
    ) -> Result<Accepted, ApiError> {
        let path = format!("api/v1/applications/{application_id}/status");
        self.post_accepted(Method::PUT, &path, Some(&StatusBody { status }))
            .await
    }

    async fn auto_apply(&self, application_id: ApplicationId) -> Result<Accepted, ApiError> {
        let path = format!("api/v1/applications/{application_id}/auto-apply");
        self.post_accepted::<()>(Method::POST, &path, None).await
    }

    async fn sync_inbox(&self) -> Result<Accepted, ApiError> {
        self.post_accepted::<()>(Method::POST, "api/v1/applications/sync-inbox", None)
            .await
    }

    async fn list_logs(&self, running_only: bool) -> Result<Vec<BackgroundTaskLog>, ApiError> {
        if running_only {
            self.get_list("api/v1/logs/?status=running").await
        } else {
            self.get_list("api/v1/logs/").await
        }
    }

    async fn running_count(&self) -> Result<u32, ApiError> {
        self.get_json::<CountBody>("api/v1/logs/running")
            .await
            .map(|body| body.count)
    }

    async fn stop_all_tasks(&self) -> Result<Accepted, ApiError> {
        self.post_accepted::<()>(Method::POST, "api/v1/logs/stop-all", None)
            .await
    }

    async fn dispatch_mail(&self, request: &MailDispatch) -> Result<Accepted, ApiError> {
        self.post_accepted(Method::POST, "api/v1/scraper/dispatch-mail", Some(request))
            .await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, ApiError> {
        self.get_list("api/v1/contacts/").await
    }

    async fn list_scraped_contacts(&self) -> Result<Vec<Contact>, ApiError> {
        self.get_list("api/v1/scraper/contacts").await
    }

    async fn list_resumes(&self) -> Result<Vec<Resume>, ApiError> {
        self.get_list("api/v1/resumes/").await
    }

    async fn run_scraper(
        &self,
        target_url: &str,
        target_type: &str,
    ) -> Result<Accepted, ApiError> {
        let body = ScraperRunBody {
            target_url,
            target_type,
        };
        self.post_accepted(Method::POST, "api/v1/scraper/run", Some(&body))
            .await
    }

    async fn stop_scraper(&self) -> Result<Accepted, ApiError> {
        self.post_accepted::<()>(Method::POST, "api/v1/scraper/stop", None)
            .await
    }
}

/// Success bodies are informational; anything unparseable just has no message.
fn parse_accepted(text: &str) -> Accepted {
    let message = serde_json::from_str::<MessageBody>(text)
        .ok()
        .and_then(|body| body.message);
    Accepted { message }
}

/// Pulls `detail` out of an error body. Validation errors carry a structured
/// detail, which is rendered as JSON.
fn extract_detail(status: StatusCode, text: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| value.get("detail").cloned());
    match detail {
        Some(serde_json::Value::String(detail)) => detail,
        Some(serde_json::Value::Null) | None => {
            engine_debug!("error body without detail (status {})", status);
            status
                .canonical_reason()
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| status.to_string())
        }
        Some(other) => other.to_string(),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Transport(err.to_string())
}
