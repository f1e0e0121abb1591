use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info};
use futures_util::future::{BoxFuture, FutureExt};

use crate::client::DashboardApi;
use crate::dispatch::{BatchDispatcher, MailBatch};
use crate::poller::{Poller, PollerHandle};
use crate::{Accepted, ActionRequest, ApiError, EngineEvent, Resource, ResourceData, Ticket};

enum EngineCommand {
    StartPolling {
        resource: Resource,
        interval: Duration,
    },
    StopPolling {
        resource: Resource,
    },
    StopAll,
    FetchOnce {
        resource: Resource,
    },
    Perform {
        ticket: Ticket,
        request: ActionRequest,
    },
    DispatchBatch {
        ticket: Ticket,
        batch: MailBatch,
    },
}

/// Runs all network work on a dedicated thread with its own tokio runtime.
/// Results come back as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn DashboardApi>, dispatcher: BatchDispatcher) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("failed to start engine runtime: {}", err);
                    return;
                }
            };
            let mut engine = Engine::new(api, dispatcher, event_tx);
            while let Ok(command) = cmd_rx.recv() {
                let _guard = runtime.enter();
                engine.handle(command);
            }
            engine.stop_all();
            engine_debug!("engine thread exiting");
        });

        Self { cmd_tx, event_rx }
    }

    pub fn start_polling(&self, resource: Resource, interval: Duration) {
        self.send(EngineCommand::StartPolling { resource, interval });
    }

    pub fn stop_polling(&self, resource: Resource) {
        self.send(EngineCommand::StopPolling { resource });
    }

    pub fn stop_all(&self) {
        self.send(EngineCommand::StopAll);
    }

    pub fn fetch_once(&self, resource: Resource) {
        self.send(EngineCommand::FetchOnce { resource });
    }

    pub fn perform(&self, ticket: Ticket, request: ActionRequest) {
        self.send(EngineCommand::Perform { ticket, request });
    }

    pub fn dispatch_batch(&self, ticket: Ticket, batch: MailBatch) {
        self.send(EngineCommand::DispatchBatch { ticket, batch });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_error!("engine thread is gone; command dropped");
        }
    }
}

struct Engine {
    api: Arc<dyn DashboardApi>,
    dispatcher: BatchDispatcher,
    events: mpsc::Sender<EngineEvent>,
    pollers: HashMap<Resource, PollerHandle>,
    reads: Arc<AtomicU64>,
}

impl Engine {
    fn new(
        api: Arc<dyn DashboardApi>,
        dispatcher: BatchDispatcher,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            api,
            dispatcher,
            events,
            pollers: HashMap::new(),
            reads: Arc::new(AtomicU64::new(0)),
        }
    }

    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::StartPolling { resource, interval } => {
                if self.pollers.contains_key(&resource) {
                    engine_debug!("{:?} already polling", resource);
                    return;
                }
                let fetch = self.reader(resource, false);
                let events = self.events.clone();
                let handle = Poller::new(format!("{resource:?}"), interval).start(
                    fetch,
                    move |event: EngineEvent| {
                        let _ = events.send(event);
                    },
                );
                self.pollers.insert(resource, handle);
            }
            EngineCommand::StopPolling { resource } => {
                if let Some(handle) = self.pollers.remove(&resource) {
                    handle.stop();
                    let stats = handle.stats();
                    engine_debug!(
                        "{:?} poller stopped after {} fetches ({} ticks skipped)",
                        resource,
                        stats.issued(),
                        stats.skipped()
                    );
                }
            }
            EngineCommand::StopAll => self.stop_all(),
            EngineCommand::FetchOnce { resource } => {
                let pending = (self.reader(resource, true))();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let _ = events.send(pending.await);
                });
            }
            EngineCommand::Perform { ticket, request } => {
                let api = self.api.clone();
                let reads = self.reads.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = perform(api.as_ref(), &request).await;
                    if let Err(err) = &result {
                        engine_info!("{:?} rejected: {}", request, err);
                    }
                    let _ = events.send(EngineEvent::ActionSettled {
                        ticket,
                        reads_issued: reads.load(Ordering::Acquire),
                        result,
                    });
                });
            }
            EngineCommand::DispatchBatch { ticket, batch } => {
                let api = self.api.clone();
                let dispatcher = self.dispatcher;
                let reads = self.reads.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = dispatcher.dispatch_mail(api.as_ref(), batch).await;
                    let _ = events.send(EngineEvent::BatchSettled {
                        ticket,
                        reads_issued: reads.load(Ordering::Acquire),
                        result,
                    });
                });
            }
        }
    }

    fn stop_all(&mut self) {
        for (_, handle) in self.pollers.drain() {
            handle.stop();
        }
    }

    /// Builds the read for `resource`. Every call takes the next number from
    /// the shared read counter, so completions can be ordered by issue, both
    /// against each other and against settled actions.
    fn reader(
        &self,
        resource: Resource,
        explicit: bool,
    ) -> impl Fn() -> BoxFuture<'static, EngineEvent> + Send + Sync + 'static {
        let api = self.api.clone();
        let counter = self.reads.clone();
        move || {
            let api = api.clone();
            let seq = counter.fetch_add(1, Ordering::AcqRel) + 1;
            async move {
                let result = read(api.as_ref(), resource).await;
                if let Err(err) = &result {
                    engine_debug!("{:?} read #{} failed: {}", resource, seq, err);
                }
                EngineEvent::Fetched {
                    resource,
                    seq,
                    explicit,
                    result,
                }
            }
            .boxed()
        }
    }
}

pub async fn read(api: &dyn DashboardApi, resource: Resource) -> Result<ResourceData, ApiError> {
    match resource {
        Resource::Applications => api.list_applications().await.map(ResourceData::Applications),
        Resource::Logs => api.list_logs(false).await.map(ResourceData::Logs),
        Resource::RunningLogs => api.list_logs(true).await.map(ResourceData::Logs),
        Resource::RunningCount => api.running_count().await.map(ResourceData::RunningCount),
        Resource::Contacts => api.list_contacts().await.map(ResourceData::Contacts),
        Resource::ScrapedContacts => api
            .list_scraped_contacts()
            .await
            .map(ResourceData::Contacts),
        Resource::Resumes => api.list_resumes().await.map(ResourceData::Resumes),
    }
}

pub async fn perform(api: &dyn DashboardApi, request: &ActionRequest) -> Result<Accepted, ApiError> {
    match request {
        ActionRequest::DispatchMail(mail) => api.dispatch_mail(mail).await,
        ActionRequest::AutoApply { application_id } => api.auto_apply(*application_id).await,
        ActionRequest::UpdateStatus {
            application_id,
            status,
        } => api.update_application_status(*application_id, status).await,
        ActionRequest::SyncInbox => api.sync_inbox().await,
        ActionRequest::StopAllTasks => api.stop_all_tasks().await,
        ActionRequest::RunScraper {
            target_url,
            target_type,
        } => api.run_scraper(target_url, target_type).await,
        ActionRequest::StopScraper => api.stop_scraper().await,
    }
}
