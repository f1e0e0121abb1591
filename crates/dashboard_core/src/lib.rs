//! Dashboard core: pure state machine, wire entities and status vocabulary.
mod effect;
mod feed;
mod model;
mod msg;
mod selection;
mod state;
pub mod status;
mod update;
mod view_model;

pub use effect::{Action, Effect, ScrapeTarget, WorkKey};
pub use feed::{Feed, FeedData, View};
pub use model::{
    parse_timestamp, ApplicationId, BackgroundTaskLog, Contact, ContactId, JobApplication, LogId,
    Resume, ResumeId, TemplateId,
};
pub use msg::{BatchSummary, Failure, Msg};
pub use selection::Selection;
pub use state::{AppState, Notification, NotificationLevel, SessionState};
pub use update::update;
pub use view_model::{
    AppViewModel, ApplicationRow, ContactRow, DispatchPhase, LogRow, ResumeRow,
};
