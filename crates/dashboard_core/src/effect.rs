use crate::{ApplicationId, ContactId, Feed, ResumeId, TemplateId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartPolling { feed: Feed },
    StopPolling { feed: Feed },
    /// Explicit one-off read outside the poll cadence.
    FetchOnce { feed: Feed },
    Perform(Action),
    DispatchBatch {
        contact_ids: Vec<ContactId>,
        template_id: TemplateId,
        resume_id: ResumeId,
    },
}

/// A single start-request against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    DispatchMail {
        contact_id: ContactId,
        template_id: TemplateId,
        resume_id: ResumeId,
    },
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
        target: ScrapeTarget,
    },
    StopScraper,
}

impl Action {
    /// The key that blocks a duplicate submission while this action is out.
    pub fn work_key(&self) -> WorkKey {
        match self {
            Action::DispatchMail { contact_id, .. } => WorkKey::Contact(*contact_id),
            Action::AutoApply { application_id } | Action::UpdateStatus { application_id, .. } => {
                WorkKey::Application(*application_id)
            }
            Action::SyncInbox => WorkKey::SyncInbox,
            Action::StopAllTasks => WorkKey::StopAllTasks,
            Action::RunScraper { .. } => WorkKey::ScraperRun,
            Action::StopScraper => WorkKey::ScraperStop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkKey {
    Contact(ContactId),
    Application(ApplicationId),
    SyncInbox,
    StopAllTasks,
    ScraperRun,
    ScraperStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeTarget {
    Jobs,
    Contacts,
}

impl ScrapeTarget {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "jobs" => Some(Self::Jobs),
            "contacts" => Some(Self::Contacts),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jobs => "jobs",
            Self::Contacts => "contacts",
        }
    }
}
