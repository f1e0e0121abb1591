use chrono::{DateTime, Utc};

use crate::status::StatusBadge;
use crate::{ApplicationId, ContactId, LogId, ResumeId, SessionState, TemplateId, View};

/// Client-side projection of a dispatched item. The authoritative state
/// machine lives on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPhase {
    #[default]
    Idle,
    /// Request sent, response not yet observed.
    Working,
    /// Accepted; waiting for a read to show the result.
    AwaitingPoll,
    ReflectedSuccess,
    ReflectedError,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub view: Option<View>,
    pub applications: Vec<ApplicationRow>,
    pub prepared_count: usize,
    pub logs: Vec<LogRow>,
    pub running_tasks: Vec<LogRow>,
    pub running_count: u32,
    pub contacts: Vec<ContactRow>,
    pub scraped_contacts: Vec<ContactRow>,
    pub resumes: Vec<ResumeRow>,
    pub selected_count: usize,
    pub template_id: Option<TemplateId>,
    pub resume_id: Option<ResumeId>,
    pub batch_in_flight: bool,
    pub can_dispatch: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRow {
    pub id: ApplicationId,
    pub job_title: String,
    pub company_name: String,
    pub application_type: Option<String>,
    pub status: StatusBadge,
    pub notes: Option<String>,
    pub phase: DispatchPhase,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub id: LogId,
    pub action_type: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub status: StatusBadge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub id: ContactId,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
    pub selected: bool,
    pub phase: DispatchPhase,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeRow {
    pub id: ResumeId,
    pub filename: String,
    pub label: Option<String>,
    pub status: StatusBadge,
}
