use crate::status::ApplicationStatus;
use crate::{
    Action, AppState, ApplicationId, BatchSummary, ContactId, Effect, Failure, Feed, FeedData,
    Msg, NotificationLevel, ScrapeTarget, SessionState, View, WorkKey,
};

const SESSION_EXPIRED: &str = "Session expired. Please log in again.";
const SESSION_INACTIVE: &str = "Not signed in. Please log in first.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SessionStarted => start_session(&mut state),
        Msg::SessionEnded => end_session(&mut state),
        Msg::ViewOpened(view) => open_view(&mut state, view),
        Msg::RefreshRequested(feed) => refresh(&mut state, feed).into_iter().collect(),
        Msg::FeedFetched { feed, seq, data, .. } => {
            feed_fetched(&mut state, feed, seq, data);
            Vec::new()
        }
        Msg::FeedFailed {
            feed,
            seq,
            explicit,
            failure,
        } => feed_failed(&mut state, feed, seq, explicit, failure),
        Msg::TemplateSelected(template_id) => {
            state.set_template(template_id);
            Vec::new()
        }
        Msg::ResumeSelected(resume_id) => {
            state.set_resume(resume_id);
            Vec::new()
        }
        Msg::ContactToggled(contact_id) => {
            state.selection_mut().toggle(contact_id);
            Vec::new()
        }
        Msg::AllContactsToggled => {
            toggle_all_contacts(&mut state);
            Vec::new()
        }
        Msg::SelectionCancelled => {
            state.selection_mut().clear();
            Vec::new()
        }
        Msg::DispatchMailClicked(contact_id) => dispatch_mail(&mut state, contact_id),
        Msg::BatchDispatchClicked => dispatch_batch(&mut state),
        Msg::AutoApplyClicked(application_id) => auto_apply(&mut state, application_id),
        Msg::StatusChangeRequested {
            application_id,
            status,
        } => change_status(&mut state, application_id, &status),
        Msg::SyncInboxClicked => perform(&mut state, Action::SyncInbox),
        Msg::StopAllClicked => perform(&mut state, Action::StopAllTasks),
        Msg::ScraperRunRequested {
            target_url,
            target_type,
        } => run_scraper(&mut state, &target_url, &target_type),
        Msg::ScraperStopClicked => perform(&mut state, Action::StopScraper),
        Msg::ActionSettled {
            action,
            reads_issued,
            result,
        } => action_settled(&mut state, action, reads_issued, result),
        Msg::BatchSettled {
            summary,
            reads_issued,
        } => batch_settled(&mut state, summary, reads_issued),
    };

    (state, effects)
}

fn start_session(state: &mut AppState) -> Vec<Effect> {
    if state.session() == SessionState::Active {
        return Vec::new();
    }
    state.set_session(SessionState::Active);

    let mut effects = Vec::new();
    if state.activate_feed(Feed::RunningTasks) {
        effects.push(Effect::StartPolling {
            feed: Feed::RunningTasks,
        });
    }
    if let Some(view) = state.current_view() {
        effects.extend(mount_feeds(state, view.feeds()));
    }
    effects
}

fn end_session(state: &mut AppState) -> Vec<Effect> {
    state.set_session(SessionState::Idle);
    state.set_view(None);
    stop_all(state)
}

fn expire_session(state: &mut AppState) -> Vec<Effect> {
    if state.session() == SessionState::Expired {
        return Vec::new();
    }
    state.set_session(SessionState::Expired);
    state.notify(NotificationLevel::Error, SESSION_EXPIRED);
    stop_all(state)
}

fn stop_all(state: &mut AppState) -> Vec<Effect> {
    state
        .drain_active_feeds()
        .into_iter()
        .map(|feed| Effect::StopPolling { feed })
        .collect()
}

fn open_view(state: &mut AppState, view: View) -> Vec<Effect> {
    let previous = state.current_view();
    if previous == Some(view) {
        return Vec::new();
    }
    state.set_view(Some(view));
    if state.session() != SessionState::Active {
        // Feeds mount once a session starts.
        return Vec::new();
    }

    let mut effects = Vec::new();
    if let Some(previous) = previous {
        for feed in previous.feeds() {
            if !view.feeds().contains(feed) && state.deactivate_feed(*feed) {
                effects.push(Effect::StopPolling { feed: *feed });
            }
        }
    }
    effects.extend(mount_feeds(state, view.feeds()));
    effects
}

fn mount_feeds(state: &mut AppState, feeds: &[Feed]) -> Vec<Effect> {
    let mut effects = Vec::new();
    for feed in feeds {
        if state.activate_feed(*feed) {
            // The first read of a freshly mounted view reports its failure.
            state.mark_surfacing(*feed);
            effects.push(Effect::StartPolling { feed: *feed });
        }
    }
    effects
}

fn refresh(state: &mut AppState, feed: Feed) -> Option<Effect> {
    if state.session() != SessionState::Active || !state.is_polling(feed) {
        return None;
    }
    Some(Effect::FetchOnce { feed })
}

fn feed_fetched(state: &mut AppState, feed: Feed, seq: u64, data: FeedData) {
    if !state.is_polling(feed) || data.feed() != feed || !state.is_fresh(feed, seq) {
        return;
    }
    state.take_surfacing(feed);
    state.apply_feed(seq, data);
}

fn feed_failed(
    state: &mut AppState,
    feed: Feed,
    seq: u64,
    explicit: bool,
    failure: Failure,
) -> Vec<Effect> {
    // A failed refresh replaces no data, so it is reported even when a newer
    // read has already landed.
    if !state.is_polling(feed) || !(explicit || state.is_fresh(feed, seq)) {
        return Vec::new();
    }
    match failure {
        Failure::Unauthorized => expire_session(state),
        Failure::Message(message) => {
            // Background poll failures keep stale data and stay silent.
            let first_load = state.take_surfacing(feed);
            if explicit || first_load {
                state.notify(
                    NotificationLevel::Error,
                    format!("Failed to load {}: {}", feed_label(feed), message),
                );
            }
            Vec::new()
        }
    }
}

fn toggle_all_contacts(state: &mut AppState) {
    let visible: Vec<ContactId> = state.contacts().iter().map(|c| c.id).collect();
    let all_selected =
        !visible.is_empty() && visible.iter().all(|id| state.selection().contains(*id));
    let selection = state.selection_mut();
    if all_selected {
        selection.clear();
    } else {
        for id in visible {
            selection.insert(id);
        }
    }
}

fn require_session(state: &mut AppState) -> bool {
    match state.session() {
        SessionState::Active => true,
        SessionState::Expired => {
            state.notify(NotificationLevel::Error, SESSION_EXPIRED);
            false
        }
        SessionState::Idle => {
            state.notify(NotificationLevel::Error, SESSION_INACTIVE);
            false
        }
    }
}

fn reject(state: &mut AppState, text: impl Into<String>) -> Vec<Effect> {
    state.notify(NotificationLevel::Error, text);
    Vec::new()
}

fn perform(state: &mut AppState, action: Action) -> Vec<Effect> {
    if !require_session(state) {
        return Vec::new();
    }
    // A key that is already out keeps its control disabled; repeat clicks do nothing.
    if !state.begin_work(action.work_key()) {
        return Vec::new();
    }
    vec![Effect::Perform(action)]
}

fn dispatch_mail(state: &mut AppState, contact_id: ContactId) -> Vec<Effect> {
    let (Some(template_id), Some(resume_id)) = (state.template_id(), state.resume_id()) else {
        return reject(state, "Select a template and resume first.");
    };
    perform(
        state,
        Action::DispatchMail {
            contact_id,
            template_id,
            resume_id,
        },
    )
}

fn dispatch_batch(state: &mut AppState) -> Vec<Effect> {
    if state.batch_in_flight() {
        return Vec::new();
    }
    let (Some(template_id), Some(resume_id)) = (state.template_id(), state.resume_id()) else {
        return reject(state, "Select a template and resume first.");
    };
    if state.selection().is_empty() {
        return reject(state, "Select recipients first.");
    }
    if !require_session(state) {
        return Vec::new();
    }
    state.set_batch_in_flight(true);
    vec![Effect::DispatchBatch {
        contact_ids: state.selection().ids().to_vec(),
        template_id,
        resume_id,
    }]
}

fn auto_apply(state: &mut AppState, application_id: ApplicationId) -> Vec<Effect> {
    if is_closed(state, application_id) {
        return reject(state, format!("Application #{application_id} is closed."));
    }
    perform(state, Action::AutoApply { application_id })
}

fn change_status(state: &mut AppState, application_id: ApplicationId, status: &str) -> Vec<Effect> {
    let status = status.trim().to_ascii_lowercase();
    if status.is_empty() {
        return reject(state, "Must provide new status.");
    }
    if is_closed(state, application_id) {
        return reject(state, format!("Application #{application_id} is already closed."));
    }
    perform(
        state,
        Action::UpdateStatus {
            application_id,
            status,
        },
    )
}

fn is_closed(state: &AppState, application_id: ApplicationId) -> bool {
    state
        .application(application_id)
        .is_some_and(|app| ApplicationStatus::parse(&app.status).is_closed())
}

fn run_scraper(state: &mut AppState, target_url: &str, target_type: &str) -> Vec<Effect> {
    let target_url = target_url.trim();
    if target_url.is_empty() {
        return reject(state, "Enter a target URL first.");
    }
    let Some(target) = ScrapeTarget::parse(target_type) else {
        return reject(
            state,
            "Invalid target type. Must be 'jobs' or 'contacts'.",
        );
    };
    perform(
        state,
        Action::RunScraper {
            target_url: target_url.to_string(),
            target,
        },
    )
}

fn action_settled(
    state: &mut AppState,
    action: Action,
    reads_issued: u64,
    result: Result<Option<String>, Failure>,
) -> Vec<Effect> {
    let key = action.work_key();
    state.finish_work(key);

    let message = match result {
        Ok(message) => message,
        Err(Failure::Unauthorized) => return expire_session(state),
        Err(Failure::Message(detail)) => return reject(state, detail),
    };

    let mut effects = Vec::new();
    match action {
        Action::DispatchMail { .. } => {
            state.notify(
                NotificationLevel::Success,
                message.unwrap_or_else(|| "Outreach email initiated.".to_string()),
            );
            state.await_poll(key, reads_issued);
        }
        Action::AutoApply { application_id } => {
            state.notify(
                NotificationLevel::Success,
                format!(
                    "Auto-Apply dispatched for Application #{application_id}. Check Logs for progress."
                ),
            );
            // The accept only confirms the enqueue; the badge moves on a later read.
            state.await_poll(key, reads_issued);
            effects.extend(refresh(state, Feed::Applications));
        }
        Action::UpdateStatus { status, .. } => {
            state.notify(
                NotificationLevel::Success,
                format!("Application updated to {}", status.to_uppercase()),
            );
            effects.extend(refresh(state, Feed::Applications));
        }
        Action::SyncInbox => {
            state.notify(
                NotificationLevel::Success,
                "Inbox Scanner dispatched. Updates will appear shortly.",
            );
        }
        Action::StopAllTasks => {
            state.notify(
                NotificationLevel::Success,
                message.unwrap_or_else(|| "Stop requested for all running tasks.".to_string()),
            );
            for feed in [Feed::Logs, Feed::RunningCount, Feed::RunningTasks] {
                effects.extend(refresh(state, feed));
            }
        }
        Action::RunScraper { target_url, .. } => {
            state.notify(
                NotificationLevel::Success,
                format!("Scraper started for {target_url}. Check Logs for progress."),
            );
        }
        Action::StopScraper => {
            state.notify(
                NotificationLevel::Success,
                message.unwrap_or_else(|| "Scraper stop requested.".to_string()),
            );
        }
    }
    effects
}

fn batch_settled(state: &mut AppState, summary: BatchSummary, reads_issued: u64) -> Vec<Effect> {
    state.set_batch_in_flight(false);
    state.notify(
        NotificationLevel::Success,
        format!(
            "Batch Complete: {} Sent, {} Failed.",
            summary.sent(),
            summary.failed_count()
        ),
    );
    state.selection_mut().clear();
    for contact_id in &summary.accepted {
        state.await_poll(WorkKey::Contact(*contact_id), reads_issued);
    }
    if summary.unauthorized {
        return expire_session(state);
    }
    Vec::new()
}

fn feed_label(feed: Feed) -> &'static str {
    match feed {
        Feed::RunningTasks => "running tasks",
        Feed::Applications => "applications",
        Feed::Logs => "system logs",
        Feed::RunningCount => "running task count",
        Feed::Contacts => "contacts",
        Feed::ScrapedContacts => "scraped contacts",
        Feed::Resumes => "resumes",
    }
}
