use std::collections::HashMap;
use std::time::Duration;

use dashboard_core::{Action, BatchSummary, ContactId, Effect, Failure, Feed, FeedData, Msg};
use dashboard_engine::{
    ActionRequest, ApiError, BatchReport, EngineEvent, EngineHandle, MailBatch, MailDispatch,
    Resource, ResourceData, Ticket,
};
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};

use super::config::PollIntervals;

/// Turns core effects into engine commands and engine events back into core
/// messages. Tickets tie a settled request to the action that started it.
pub struct EffectRunner {
    engine: EngineHandle,
    intervals: PollIntervals,
    next_ticket: Ticket,
    actions: HashMap<Ticket, Action>,
    batches: HashMap<Ticket, Vec<ContactId>>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, intervals: PollIntervals) -> Self {
        Self {
            engine,
            intervals,
            next_ticket: 0,
            actions: HashMap::new(),
            batches: HashMap::new(),
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartPolling { feed } => {
                    let interval = self.intervals.for_feed(feed);
                    engine_info!("StartPolling {:?} every {:?}", feed, interval);
                    self.engine.start_polling(resource_for(feed), interval);
                }
                Effect::StopPolling { feed } => {
                    engine_info!("StopPolling {:?}", feed);
                    self.engine.stop_polling(resource_for(feed));
                }
                Effect::FetchOnce { feed } => {
                    engine_debug!("FetchOnce {:?}", feed);
                    self.engine.fetch_once(resource_for(feed));
                }
                Effect::Perform(action) => {
                    let ticket = self.ticket();
                    engine_info!("Perform #{} {:?}", ticket, action);
                    self.engine.perform(ticket, request_for(&action));
                    self.actions.insert(ticket, action);
                }
                Effect::DispatchBatch {
                    contact_ids,
                    template_id,
                    resume_id,
                } => {
                    let ticket = self.ticket();
                    engine_info!("DispatchBatch #{} ({} contacts)", ticket, contact_ids.len());
                    self.batches.insert(ticket, contact_ids.clone());
                    self.engine.dispatch_batch(
                        ticket,
                        MailBatch {
                            contact_ids,
                            template_id: Some(template_id),
                            resume_id: Some(resume_id),
                        },
                    );
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event and maps it.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        self.map_event(event)
    }

    fn map_event(&mut self, event: EngineEvent) -> Option<Msg> {
        match event {
            EngineEvent::Fetched {
                resource,
                seq,
                explicit,
                result,
            } => {
                let feed = feed_for(resource);
                match result {
                    Ok(data) => match feed_data(feed, data) {
                        Some(data) => Some(Msg::FeedFetched {
                            feed,
                            seq,
                            explicit,
                            data,
                        }),
                        None => {
                            engine_error!("{:?} read returned data of another shape", feed);
                            None
                        }
                    },
                    Err(err) => Some(Msg::FeedFailed {
                        feed,
                        seq,
                        explicit,
                        failure: failure_from(&err),
                    }),
                }
            }
            EngineEvent::ActionSettled {
                ticket,
                reads_issued,
                result,
            } => {
                let Some(action) = self.actions.remove(&ticket) else {
                    engine_warn!("settled ticket #{} has no pending action", ticket);
                    return None;
                };
                let result = result
                    .map(|accepted| accepted.message)
                    .map_err(|err| failure_from(&err));
                Some(Msg::ActionSettled {
                    action,
                    reads_issued,
                    result,
                })
            }
            EngineEvent::BatchSettled {
                ticket,
                reads_issued,
                result,
            } => {
                let ids = self.batches.remove(&ticket).unwrap_or_default();
                let summary = match result {
                    Ok(report) => summarize(&report),
                    Err(err) => {
                        engine_error!("batch #{} rejected before sending: {}", ticket, err);
                        BatchSummary {
                            accepted: Vec::new(),
                            failed: ids,
                            unauthorized: false,
                        }
                    }
                };
                Some(Msg::BatchSettled {
                    summary,
                    reads_issued,
                })
            }
        }
    }

    fn ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        self.next_ticket
    }
}

fn resource_for(feed: Feed) -> Resource {
    match feed {
        Feed::RunningTasks => Resource::RunningLogs,
        Feed::Applications => Resource::Applications,
        Feed::Logs => Resource::Logs,
        Feed::RunningCount => Resource::RunningCount,
        Feed::Contacts => Resource::Contacts,
        Feed::ScrapedContacts => Resource::ScrapedContacts,
        Feed::Resumes => Resource::Resumes,
    }
}

fn feed_for(resource: Resource) -> Feed {
    match resource {
        Resource::RunningLogs => Feed::RunningTasks,
        Resource::Applications => Feed::Applications,
        Resource::Logs => Feed::Logs,
        Resource::RunningCount => Feed::RunningCount,
        Resource::Contacts => Feed::Contacts,
        Resource::ScrapedContacts => Feed::ScrapedContacts,
        Resource::Resumes => Feed::Resumes,
    }
}

fn feed_data(feed: Feed, data: ResourceData) -> Option<FeedData> {
    Some(match (feed, data) {
        (Feed::RunningTasks, ResourceData::Logs(logs)) => FeedData::RunningTasks(logs),
        (Feed::Logs, ResourceData::Logs(logs)) => FeedData::Logs(logs),
        (Feed::Applications, ResourceData::Applications(apps)) => FeedData::Applications(apps),
        (Feed::RunningCount, ResourceData::RunningCount(count)) => FeedData::RunningCount(count),
        (Feed::Contacts, ResourceData::Contacts(contacts)) => FeedData::Contacts(contacts),
        (Feed::ScrapedContacts, ResourceData::Contacts(contacts)) => {
            FeedData::ScrapedContacts(contacts)
        }
        (Feed::Resumes, ResourceData::Resumes(resumes)) => FeedData::Resumes(resumes),
        _ => return None,
    })
}

fn failure_from(err: &ApiError) -> Failure {
    match err {
        ApiError::Unauthorized => Failure::Unauthorized,
        other => Failure::Message(other.to_string()),
    }
}

fn request_for(action: &Action) -> ActionRequest {
    match action {
        Action::DispatchMail {
            contact_id,
            template_id,
            resume_id,
        } => ActionRequest::DispatchMail(MailDispatch {
            contact_id: *contact_id,
            template_id: *template_id,
            resume_id: *resume_id,
        }),
        Action::AutoApply { application_id } => ActionRequest::AutoApply {
            application_id: *application_id,
        },
        Action::UpdateStatus {
            application_id,
            status,
        } => ActionRequest::UpdateStatus {
            application_id: *application_id,
            status: status.clone(),
        },
        Action::SyncInbox => ActionRequest::SyncInbox,
        Action::StopAllTasks => ActionRequest::StopAllTasks,
        Action::RunScraper { target_url, target } => ActionRequest::RunScraper {
            target_url: target_url.clone(),
            target_type: target.as_str().to_string(),
        },
        Action::StopScraper => ActionRequest::StopScraper,
    }
}

fn summarize(report: &BatchReport<ContactId>) -> BatchSummary {
    BatchSummary {
        accepted: report.accepted_items().copied().collect(),
        failed: report.failed_items().copied().collect(),
        unauthorized: report.any_unauthorized(),
    }
}
