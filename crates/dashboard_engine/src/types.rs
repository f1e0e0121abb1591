use dashboard_core::{
    ApplicationId, BackgroundTaskLog, Contact, ContactId, JobApplication, Resume,
};

use crate::dispatch::{BatchReport, DispatchError, MailDispatch};

/// Correlates an engine command with the event that settles it.
pub type Ticket = u64;

/// A readable server collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Applications,
    Logs,
    /// Logs filtered server-side to `status=running`.
    RunningLogs,
    RunningCount,
    Contacts,
    ScrapedContacts,
    Resumes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceData {
    Applications(Vec<JobApplication>),
    Logs(Vec<BackgroundTaskLog>),
    RunningCount(u32),
    Contacts(Vec<Contact>),
    Resumes(Vec<Resume>),
}

/// Acknowledgement of a request the backend runs (or has run) on its side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Accepted {
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    DispatchMail(MailDispatch),
    AutoApply {
        application_id: ApplicationId,
    },
    UpdateStatus {
        application_id: ApplicationId,
        status: String,
    },
    SyncInbox,
    StopAllTasks,
    RunScraper {
        target_url: String,
        target_type: String,
    },
    StopScraper,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// `seq` comes from one counter shared by every resource.
    Fetched {
        resource: Resource,
        seq: u64,
        /// Issued by `fetch_once` rather than a poller tick.
        explicit: bool,
        result: Result<ResourceData, ApiError>,
    },
    /// `reads_issued` is the last read `seq` handed out when the answer arrived.
    ActionSettled {
        ticket: Ticket,
        reads_issued: u64,
        result: Result<Accepted, ApiError>,
    },
    BatchSettled {
        ticket: Ticket,
        reads_issued: u64,
        result: Result<BatchReport<ContactId>, DispatchError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Transport(String),
    /// Missing or rejected bearer token.
    #[error("unauthorized")]
    Unauthorized,
    /// Non-2xx answer; `detail` is the server's own message when it sent one.
    #[error("{detail}")]
    Application { status: u16, detail: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
