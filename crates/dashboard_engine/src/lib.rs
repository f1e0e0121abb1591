//! Dashboard engine: authenticated API client, pollers and batch dispatch.
mod client;
mod dispatch;
mod engine;
mod persist;
mod poller;
mod types;

pub use client::{ClientSettings, DashboardApi, ReqwestApi, Session};
pub use dispatch::{BatchDispatcher, BatchReport, DispatchError, ItemOutcome, MailBatch, MailDispatch};
pub use engine::{perform, read, EngineHandle};
pub use persist::{write_atomically, PersistError};
pub use poller::{Poller, PollerHandle, PollerStats};
pub use types::{
    Accepted, ActionRequest, ApiError, EngineEvent, Resource, ResourceData, Ticket,
};
