//! Status vocabulary: maps server status tokens to display badges.
//!
//! The backend owns the status set and may add tokens at any time, so every
//! parser here has an `Other` arm that keeps the raw token and every badge for
//! an unknown token renders that token verbatim.

use std::fmt;

/// Visual weight of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Neutral,
    Muted,
    Info,
    Progress,
    Caution,
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: String,
    pub emphasis: Emphasis,
    /// In-progress states get a motion indicator.
    pub pulse: bool,
}

impl StatusBadge {
    fn new(label: &str, emphasis: Emphasis) -> Self {
        Self {
            label: label.to_string(),
            emphasis,
            pulse: false,
        }
    }

    fn pulsing(label: &str, emphasis: Emphasis) -> Self {
        Self {
            pulse: true,
            ..Self::new(label, emphasis)
        }
    }

    fn raw(token: &str) -> Self {
        Self::new(token, Emphasis::Neutral)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationStatus {
    Shortlisted,
    Prepared,
    Processing,
    Applied,
    Submitted,
    Interviewing,
    Offer,
    Rejected,
    Error,
    Acknowledged,
    Responded,
    Closed,
    Other(String),
}

impl ApplicationStatus {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "shortlisted" => Self::Shortlisted,
            "prepared" => Self::Prepared,
            "processing" => Self::Processing,
            "applied" => Self::Applied,
            "submitted" => Self::Submitted,
            "interviewing" => Self::Interviewing,
            "offer" => Self::Offer,
            "rejected" => Self::Rejected,
            "error" => Self::Error,
            "acknowledged" => Self::Acknowledged,
            "responded" => Self::Responded,
            "closed" => Self::Closed,
            _ => Self::Other(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Shortlisted => "shortlisted",
            Self::Prepared => "prepared",
            Self::Processing => "processing",
            Self::Applied => "applied",
            Self::Submitted => "submitted",
            Self::Interviewing => "interviewing",
            Self::Offer => "offer",
            Self::Rejected => "rejected",
            Self::Error => "error",
            Self::Acknowledged => "acknowledged",
            Self::Responded => "responded",
            Self::Closed => "closed",
            Self::Other(raw) => raw,
        }
    }

    /// `closed` absorbs: nothing further can be requested from it.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// The backend is still working on it; a later read will move it again.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Processing)
    }

    pub fn badge(&self) -> StatusBadge {
        match self {
            Self::Shortlisted => StatusBadge::new("Shortlisted", Emphasis::Neutral),
            Self::Prepared => StatusBadge::new("Prepared", Emphasis::Caution),
            Self::Processing => StatusBadge::pulsing("Processing", Emphasis::Progress),
            Self::Applied => StatusBadge::new("Applied", Emphasis::Muted),
            Self::Submitted => StatusBadge::new("Submitted", Emphasis::Info),
            Self::Interviewing => StatusBadge::new("Interviewing", Emphasis::Info),
            Self::Offer => StatusBadge::new("Offer", Emphasis::Positive),
            Self::Rejected => StatusBadge::new("Rejected", Emphasis::Negative),
            Self::Error => StatusBadge::new("Error", Emphasis::Negative),
            Self::Acknowledged => StatusBadge::new("Acknowledged", Emphasis::Info),
            Self::Responded => StatusBadge::new("Responded", Emphasis::Positive),
            Self::Closed => StatusBadge::new("Closed", Emphasis::Muted),
            Self::Other(raw) => StatusBadge::raw(raw),
        }
    }
}

impl From<&str> for ApplicationStatus {
    fn from(token: &str) -> Self {
        Self::parse(token)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a background task log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Success,
    Failed,
    Other(String),
}

impl TaskStatus {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "success" => Self::Success,
            "failed" => Self::Failed,
            _ => Self::Other(token.to_string()),
        }
    }

    pub fn badge(&self) -> StatusBadge {
        match self {
            Self::Running => StatusBadge::pulsing("Running", Emphasis::Progress),
            Self::Success => StatusBadge::new("Success", Emphasis::Positive),
            Self::Failed => StatusBadge::new("Failed", Emphasis::Negative),
            Self::Other(raw) => StatusBadge::raw(raw),
        }
    }
}

pub fn application_badge(token: &str) -> StatusBadge {
    ApplicationStatus::parse(token).badge()
}

pub fn task_badge(token: &str) -> StatusBadge {
    TaskStatus::parse(token).badge()
}

/// Resume extraction runs in the background; pending and processing pulse.
pub fn resume_badge(token: &str) -> StatusBadge {
    match token.trim().to_ascii_lowercase().as_str() {
        "pending" => StatusBadge::pulsing("Pending", Emphasis::Muted),
        "processing" => StatusBadge::pulsing("Processing", Emphasis::Progress),
        "completed" => StatusBadge::new("Ready", Emphasis::Positive),
        "error" => StatusBadge::new("Error", Emphasis::Negative),
        _ => StatusBadge::raw(token),
    }
}
