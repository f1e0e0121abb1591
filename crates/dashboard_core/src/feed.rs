use crate::{BackgroundTaskLog, Contact, JobApplication, Resume};

/// A screen the user can have open. Each view owns a fixed set of feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum View {
    Applications,
    Logs,
    ColdMail,
    Scraper,
    Resumes,
}

impl View {
    pub fn feeds(self) -> &'static [Feed] {
        match self {
            View::Applications => &[Feed::Applications],
            View::Logs => &[Feed::Logs, Feed::RunningCount],
            View::ColdMail => &[Feed::Contacts],
            View::Scraper => &[Feed::ScrapedContacts],
            View::Resumes => &[Feed::Resumes],
        }
    }
}

/// One polled server resource; each feed fills exactly one view-state slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feed {
    /// Session-wide running-task indicator.
    RunningTasks,
    Applications,
    Logs,
    RunningCount,
    Contacts,
    ScrapedContacts,
    Resumes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedData {
    RunningTasks(Vec<BackgroundTaskLog>),
    Applications(Vec<JobApplication>),
    Logs(Vec<BackgroundTaskLog>),
    RunningCount(u32),
    Contacts(Vec<Contact>),
    ScrapedContacts(Vec<Contact>),
    Resumes(Vec<Resume>),
}

impl FeedData {
    pub fn feed(&self) -> Feed {
        match self {
            FeedData::RunningTasks(_) => Feed::RunningTasks,
            FeedData::Applications(_) => Feed::Applications,
            FeedData::Logs(_) => Feed::Logs,
            FeedData::RunningCount(_) => Feed::RunningCount,
            FeedData::Contacts(_) => Feed::Contacts,
            FeedData::ScrapedContacts(_) => Feed::ScrapedContacts,
            FeedData::Resumes(_) => Feed::Resumes,
        }
    }
}
