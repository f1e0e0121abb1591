use std::fmt::Debug;
use std::future::Future;
use std::num::NonZeroUsize;

use dashboard_core::{ContactId, ResumeId, TemplateId};
use engine_logging::{engine_info, engine_warn};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;

use crate::client::DashboardApi;
use crate::{Accepted, ApiError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Select recipients first.")]
    EmptySelection,
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Body of one outreach email request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailDispatch {
    pub contact_id: ContactId,
    pub template_id: TemplateId,
    pub resume_id: ResumeId,
}

/// Recipients plus the shared parameters for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailBatch {
    pub contact_ids: Vec<ContactId>,
    pub template_id: Option<TemplateId>,
    pub resume_id: Option<ResumeId>,
}

impl MailBatch {
    pub fn into_requests(self) -> Result<Vec<MailDispatch>, DispatchError> {
        let template_id = self
            .template_id
            .ok_or(DispatchError::MissingParameter("template_id"))?;
        let resume_id = self
            .resume_id
            .ok_or(DispatchError::MissingParameter("resume_id"))?;
        if self.contact_ids.is_empty() {
            return Err(DispatchError::EmptySelection);
        }
        Ok(self
            .contact_ids
            .into_iter()
            .map(|contact_id| MailDispatch {
                contact_id,
                template_id,
                resume_id,
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome<I> {
    pub item: I,
    pub result: Result<Accepted, ApiError>,
}

/// Per-item results, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport<I> {
    pub outcomes: Vec<ItemOutcome<I>>,
}

impl<I> BatchReport<I> {
    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }

    pub fn accepted_items(&self) -> impl Iterator<Item = &I> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| &o.item)
    }

    pub fn failed_items(&self) -> impl Iterator<Item = &I> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| &o.item)
    }

    pub fn any_unauthorized(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.result, Err(ApiError::Unauthorized)))
    }
}

/// Runs a list of operations with bounded concurrency, collecting each
/// outcome. With the default concurrency of one, item N+1 starts only after
/// item N has settled, and a failed item never stops the rest.
#[derive(Debug, Clone, Copy)]
pub struct BatchDispatcher {
    concurrency: NonZeroUsize,
}

impl Default for BatchDispatcher {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::MIN,
        }
    }
}

impl BatchDispatcher {
    pub fn new(concurrency: NonZeroUsize) -> Self {
        Self { concurrency }
    }

    pub fn concurrency(&self) -> NonZeroUsize {
        self.concurrency
    }

    pub async fn run<I, F, Fut>(
        &self,
        items: Vec<I>,
        operation: F,
    ) -> Result<BatchReport<I>, DispatchError>
    where
        I: Clone + Debug,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<Accepted, ApiError>>,
    {
        if items.is_empty() {
            return Err(DispatchError::EmptySelection);
        }
        let total = items.len();

        let outcomes: Vec<ItemOutcome<I>> = stream::iter(items)
            .map(|item| {
                let pending = operation(item.clone());
                async move {
                    let result = pending.await;
                    match &result {
                        Ok(_) => engine_info!("batch item {:?} accepted", item),
                        Err(err) => engine_warn!("batch item {:?} failed: {}", item, err),
                    }
                    ItemOutcome { item, result }
                }
            })
            .buffered(self.concurrency.get())
            .collect()
            .await;

        let report = BatchReport { outcomes };
        engine_info!(
            "batch finished: {} of {} sent, {} failed",
            report.sent(),
            total,
            report.failed()
        );
        Ok(report)
    }

    /// Sends one outreach email per selected contact.
    pub async fn dispatch_mail(
        &self,
        api: &dyn DashboardApi,
        batch: MailBatch,
    ) -> Result<BatchReport<ContactId>, DispatchError> {
        let requests = batch.into_requests()?;
        let report = self
            .run(requests, |request| async move {
                api.dispatch_mail(&request).await
            })
            .await?;

        Ok(BatchReport {
            outcomes: report
                .outcomes
                .into_iter()
                .map(|outcome| ItemOutcome {
                    item: outcome.item.contact_id,
                    result: outcome.result,
                })
                .collect(),
        })
    }
}
