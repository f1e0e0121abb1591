use crate::{Action, ApplicationId, ContactId, Feed, FeedData, ResumeId, TemplateId, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Credentials are in place; the shell starts its running-task indicator.
    SessionStarted,
    /// Tear everything down (process exit, logout).
    SessionEnded,
    /// User navigated to a view; the previous view's feeds are released.
    ViewOpened(View),
    /// User asked for an immediate refresh of a feed.
    RefreshRequested(Feed),
    /// A read finished. `seq` orders reads by issue time.
    /// `explicit` is set for a one-off refresh, clear for a poll tick.
    FeedFetched {
        feed: Feed,
        seq: u64,
        explicit: bool,
        data: FeedData,
    },
    FeedFailed {
        feed: Feed,
        seq: u64,
        explicit: bool,
        failure: Failure,
    },
    TemplateSelected(Option<TemplateId>),
    ResumeSelected(Option<ResumeId>),
    ContactToggled(ContactId),
    /// Select every visible contact, or clear if all are already selected.
    AllContactsToggled,
    SelectionCancelled,
    DispatchMailClicked(ContactId),
    BatchDispatchClicked,
    AutoApplyClicked(ApplicationId),
    StatusChangeRequested {
        application_id: ApplicationId,
        status: String,
    },
    SyncInboxClicked,
    StopAllClicked,
    ScraperRunRequested { target_url: String, target_type: String },
    ScraperStopClicked,
    /// Backend answered a single action. `Ok` carries the server message, if any.
    /// `reads_issued` is the highest read `seq` handed out when it settled.
    ActionSettled {
        action: Action,
        reads_issued: u64,
        result: Result<Option<String>, Failure>,
    },
    BatchSettled {
        summary: BatchSummary,
        reads_issued: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Credentials missing or rejected.
    Unauthorized,
    /// Anything else, with the text to show the user verbatim.
    Message(String),
}

/// Outcome of a whole batch, ids in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub accepted: Vec<ContactId>,
    pub failed: Vec<ContactId>,
    /// Set when any item was rejected for bad credentials.
    pub unauthorized: bool,
}

impl BatchSummary {
    pub fn sent(&self) -> usize {
        self.accepted.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}
