use std::collections::{BTreeMap, BTreeSet};

use crate::status::{application_badge, resume_badge, task_badge, ApplicationStatus};
use crate::view_model::{
    AppViewModel, ApplicationRow, ContactRow, DispatchPhase, LogRow, ResumeRow,
};
use crate::{
    ApplicationId, BackgroundTaskLog, Contact, Feed, FeedData, JobApplication, Resume, ResumeId,
    Selection, TemplateId, View, WorkKey,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active,
    /// The backend rejected our credentials; nothing polls until a new session.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient user-facing message (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

/// Accepted dispatch waiting for a read to show its effect.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AwaitingPoll {
    /// Application status when the dispatch was accepted, advanced through
    /// in-progress states.
    baseline: Option<String>,
    /// Reads numbered up to here were issued before the accept and cannot
    /// show its effect.
    issued_before: u64,
}

impl AwaitingPoll {
    fn is_later(&self, seq: u64) -> bool {
        seq > self.issued_before
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    view: Option<View>,
    active_feeds: BTreeSet<Feed>,
    /// Freshly mounted feeds; their first failed poll is reported.
    surfacing: BTreeSet<Feed>,
    applied_seq: BTreeMap<Feed, u64>,
    applications: Vec<JobApplication>,
    logs: Vec<BackgroundTaskLog>,
    running_tasks: Vec<BackgroundTaskLog>,
    running_count: u32,
    contacts: Vec<Contact>,
    scraped_contacts: Vec<Contact>,
    resumes: Vec<Resume>,
    template_id: Option<TemplateId>,
    resume_id: Option<ResumeId>,
    selection: Selection,
    working: BTreeSet<WorkKey>,
    batch_in_flight: bool,
    awaiting: BTreeMap<WorkKey, AwaitingPoll>,
    reflected: BTreeMap<WorkKey, DispatchPhase>,
    notifications: Vec<Notification>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            view: self.view,
            applications: self
                .applications
                .iter()
                .map(|app| self.application_row(app))
                .collect(),
            prepared_count: self
                .applications
                .iter()
                .filter(|app| ApplicationStatus::parse(&app.status) == ApplicationStatus::Prepared)
                .count(),
            logs: self.logs.iter().map(log_row).collect(),
            running_tasks: self.running_tasks.iter().map(log_row).collect(),
            running_count: self.running_count,
            contacts: self.contacts.iter().map(|c| self.contact_row(c)).collect(),
            scraped_contacts: self
                .scraped_contacts
                .iter()
                .map(|c| self.contact_row(c))
                .collect(),
            resumes: self.resumes.iter().map(resume_row).collect(),
            selected_count: self.selection.len(),
            template_id: self.template_id,
            resume_id: self.resume_id,
            batch_in_flight: self.batch_in_flight,
            can_dispatch: self.template_id.is_some() && self.resume_id.is_some(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn current_view(&self) -> Option<View> {
        self.view
    }

    pub fn is_polling(&self, feed: Feed) -> bool {
        self.active_feeds.contains(&feed)
    }

    pub fn active_feeds(&self) -> impl Iterator<Item = Feed> + '_ {
        self.active_feeds.iter().copied()
    }

    /// True while any request started by the user has not settled.
    pub fn has_pending_work(&self) -> bool {
        self.batch_in_flight || !self.working.is_empty()
    }

    pub fn is_working(&self, key: WorkKey) -> bool {
        self.working.contains(&key)
    }

    pub fn batch_in_flight(&self) -> bool {
        self.batch_in_flight
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn applications(&self) -> &[JobApplication] {
        &self.applications
    }

    pub fn logs(&self) -> &[BackgroundTaskLog] {
        &self.logs
    }

    pub fn running_tasks(&self) -> &[BackgroundTaskLog] {
        &self.running_tasks
    }

    pub fn running_count(&self) -> u32 {
        self.running_count
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn scraped_contacts(&self) -> &[Contact] {
        &self.scraped_contacts
    }

    pub fn resumes(&self) -> &[Resume] {
        &self.resumes
    }

    pub fn template_id(&self) -> Option<TemplateId> {
        self.template_id
    }

    pub fn resume_id(&self) -> Option<ResumeId> {
        self.resume_id
    }

    pub fn phase(&self, key: WorkKey) -> DispatchPhase {
        if self.working.contains(&key) {
            DispatchPhase::Working
        } else if self.awaiting.contains_key(&key) {
            DispatchPhase::AwaitingPoll
        } else {
            self.reflected
                .get(&key)
                .copied()
                .unwrap_or(DispatchPhase::Idle)
        }
    }

    pub fn application(&self, id: ApplicationId) -> Option<&JobApplication> {
        self.applications.iter().find(|app| app.id == id)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, level: NotificationLevel, text: impl Into<String>) {
        self.notifications.push(Notification {
            level,
            text: text.into(),
        });
        self.dirty = true;
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        self.session = session;
        self.dirty = true;
    }

    pub(crate) fn set_view(&mut self, view: Option<View>) {
        self.view = view;
        self.dirty = true;
    }

    /// Returns false if the feed was already active.
    pub(crate) fn activate_feed(&mut self, feed: Feed) -> bool {
        self.active_feeds.insert(feed)
    }

    /// Releases a feed and discards its slot; returns false if it was not active.
    pub(crate) fn deactivate_feed(&mut self, feed: Feed) -> bool {
        if !self.active_feeds.remove(&feed) {
            return false;
        }
        self.surfacing.remove(&feed);
        self.applied_seq.remove(&feed);
        self.clear_slot(feed);
        self.dirty = true;
        true
    }

    pub(crate) fn drain_active_feeds(&mut self) -> Vec<Feed> {
        let feeds: Vec<Feed> = self.active_feeds.iter().copied().collect();
        for feed in &feeds {
            self.deactivate_feed(*feed);
        }
        feeds
    }

    pub(crate) fn mark_surfacing(&mut self, feed: Feed) {
        self.surfacing.insert(feed);
    }

    pub(crate) fn take_surfacing(&mut self, feed: Feed) -> bool {
        self.surfacing.remove(&feed)
    }

    /// False for a read issued before the one already applied.
    pub(crate) fn is_fresh(&self, feed: Feed, seq: u64) -> bool {
        self.applied_seq
            .get(&feed)
            .map_or(true, |applied| seq > *applied)
    }

    /// Replaces the feed's slot wholesale; never merges with the previous contents.
    pub(crate) fn apply_feed(&mut self, seq: u64, data: FeedData) {
        let feed = data.feed();
        self.applied_seq.insert(feed, seq);
        match data {
            FeedData::RunningTasks(logs) => {
                self.running_tasks = logs.into_iter().filter(|log| log.is_running()).collect();
            }
            FeedData::Applications(apps) => {
                self.applications = apps;
                self.reconcile_applications(seq);
            }
            FeedData::Logs(logs) => self.logs = logs,
            FeedData::RunningCount(count) => self.running_count = count,
            FeedData::Contacts(contacts) => {
                self.contacts = contacts;
                self.reconcile_contacts(seq);
            }
            FeedData::ScrapedContacts(contacts) => {
                self.scraped_contacts = contacts;
                self.reconcile_contacts(seq);
            }
            FeedData::Resumes(resumes) => self.resumes = resumes,
        }
        self.dirty = true;
    }

    pub(crate) fn set_template(&mut self, template_id: Option<TemplateId>) {
        self.template_id = template_id;
        self.dirty = true;
    }

    pub(crate) fn set_resume(&mut self, resume_id: Option<ResumeId>) {
        self.resume_id = resume_id;
        self.dirty = true;
    }

    pub(crate) fn selection_mut(&mut self) -> &mut Selection {
        self.dirty = true;
        &mut self.selection
    }

    /// Returns false if the key is already out.
    pub(crate) fn begin_work(&mut self, key: WorkKey) -> bool {
        if !self.working.insert(key) {
            return false;
        }
        self.awaiting.remove(&key);
        self.reflected.remove(&key);
        self.dirty = true;
        true
    }

    pub(crate) fn finish_work(&mut self, key: WorkKey) {
        self.working.remove(&key);
        self.dirty = true;
    }

    pub(crate) fn set_batch_in_flight(&mut self, in_flight: bool) {
        self.batch_in_flight = in_flight;
        self.dirty = true;
    }

    pub(crate) fn await_poll(&mut self, key: WorkKey, issued_before: u64) {
        let baseline = match key {
            WorkKey::Application(id) => self.application(id).map(|app| app.status.clone()),
            _ => None,
        };
        self.reflected.remove(&key);
        self.awaiting.insert(
            key,
            AwaitingPoll {
                baseline,
                issued_before,
            },
        );
        self.dirty = true;
    }

    fn reconcile_applications(&mut self, seq: u64) {
        let keys: Vec<WorkKey> = self
            .awaiting
            .keys()
            .copied()
            .filter(|key| matches!(key, WorkKey::Application(_)))
            .collect();
        for key in keys {
            let WorkKey::Application(id) = key else {
                continue;
            };
            let Some(app) = self.applications.iter().find(|app| app.id == id) else {
                continue;
            };
            let Some(pending) = self.awaiting.get_mut(&key) else {
                continue;
            };
            if !pending.is_later(seq)
                || pending.baseline.as_deref() == Some(app.status.as_str())
            {
                continue;
            }
            let status = ApplicationStatus::parse(&app.status);
            if status.is_in_progress() {
                pending.baseline = Some(app.status.clone());
                continue;
            }
            let phase = if status.is_failure() {
                DispatchPhase::ReflectedError
            } else {
                DispatchPhase::ReflectedSuccess
            };
            self.awaiting.remove(&key);
            self.reflected.insert(key, phase);
        }
    }

    // Contacts carry no status, so any read issued after the accept settles them.
    fn reconcile_contacts(&mut self, seq: u64) {
        let keys: Vec<WorkKey> = self
            .awaiting
            .iter()
            .filter(|(key, pending)| {
                matches!(key, WorkKey::Contact(_)) && pending.is_later(seq)
            })
            .map(|(key, _)| *key)
            .collect();
        for key in keys {
            self.awaiting.remove(&key);
            self.reflected.insert(key, DispatchPhase::ReflectedSuccess);
        }
    }

    fn clear_slot(&mut self, feed: Feed) {
        match feed {
            Feed::RunningTasks => self.running_tasks.clear(),
            Feed::Applications => self.applications.clear(),
            Feed::Logs => self.logs.clear(),
            Feed::RunningCount => self.running_count = 0,
            Feed::Contacts => self.contacts.clear(),
            Feed::ScrapedContacts => self.scraped_contacts.clear(),
            Feed::Resumes => self.resumes.clear(),
        }
    }

    fn application_row(&self, app: &JobApplication) -> ApplicationRow {
        let key = WorkKey::Application(app.id);
        ApplicationRow {
            id: app.id,
            job_title: app.job_title.clone().unwrap_or_default(),
            company_name: app.company_name.clone().unwrap_or_default(),
            application_type: app.application_type.clone(),
            status: application_badge(&app.status),
            notes: app.notes.clone(),
            phase: self.phase(key),
            busy: self.working.contains(&key),
        }
    }

    fn contact_row(&self, contact: &Contact) -> ContactRow {
        let key = WorkKey::Contact(contact.id);
        ContactRow {
            id: contact.id,
            email: contact.email.clone(),
            name: contact.name.clone(),
            role: contact.role.clone(),
            company: contact.company.clone(),
            selected: self.selection.contains(contact.id),
            phase: self.phase(key),
            busy: self.working.contains(&key),
        }
    }
}

fn log_row(log: &BackgroundTaskLog) -> LogRow {
    LogRow {
        id: log.id,
        action_type: log.action_type.clone(),
        message: log.message.clone().unwrap_or_default(),
        created_at: log.created_at,
        status: task_badge(&log.status),
    }
}

fn resume_row(resume: &Resume) -> ResumeRow {
    ResumeRow {
        id: resume.id,
        filename: resume.filename.clone(),
        label: resume.label.clone(),
        status: resume_badge(&resume.status),
    }
}
