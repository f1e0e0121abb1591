//! Wire entities as the backend serves them.
//!
//! The client only ever holds disposable copies of these. `status` fields stay
//! raw strings so unknown tokens survive decoding; interpretation happens in
//! [`crate::status`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type ApplicationId = u64;
pub type ContactId = u64;
pub type ResumeId = u64;
pub type TemplateId = u64;
pub type LogId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: ApplicationId,
    pub status: String,
    pub job_id: Option<u64>,
    pub resume_id: Option<ResumeId>,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub application_type: Option<String>,
    /// Cover letter text, or the failure trace when `status` is `error`.
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundTaskLog {
    pub id: LogId,
    pub action_type: String,
    pub status: String,
    pub message: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl BackgroundTaskLog {
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub id: ResumeId,
    pub filename: String,
    pub status: String,
    pub label: Option<String>,
}

/// Accepts RFC 3339 timestamps as well as the offset-less form the backend
/// emits for naive UTC columns.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("unrecognized timestamp: {raw}"))
    })
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
