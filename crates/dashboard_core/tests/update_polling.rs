use std::sync::Once;

use chrono::{TimeZone, Utc};
use dashboard_core::{
    update, AppState, BackgroundTaskLog, Effect, Failure, Feed, FeedData, JobApplication, Msg,
    NotificationLevel, SessionState, View,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn app(id: u64, status: &str) -> JobApplication {
    JobApplication {
        id,
        status: status.to_string(),
        job_id: Some(id * 10),
        resume_id: Some(1),
        job_title: Some(format!("Role {id}")),
        company_name: Some("Acme".to_string()),
        application_type: Some("auto".to_string()),
        notes: None,
    }
}

fn log(id: u64, status: &str) -> BackgroundTaskLog {
    BackgroundTaskLog {
        id,
        action_type: "auto_apply".to_string(),
        status: status.to_string(),
        message: Some(format!("entry {id}")),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
    }
}

fn session_with_view(view: View) -> AppState {
    let (state, _) = update(AppState::new(), Msg::SessionStarted);
    let (state, _) = update(state, Msg::ViewOpened(view));
    state
}

fn fetched(state: AppState, seq: u64, data: FeedData) -> AppState {
    let feed = data.feed();
    update(
        state,
        Msg::FeedFetched {
            feed,
            seq,
            explicit: false,
            data,
        },
    )
    .0
}

#[test]
fn session_start_polls_running_tasks_then_view_feeds() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::ViewOpened(View::Logs));
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::SessionStarted);
    assert_eq!(state.session(), SessionState::Active);
    assert_eq!(
        effects,
        vec![
            Effect::StartPolling {
                feed: Feed::RunningTasks
            },
            Effect::StartPolling { feed: Feed::Logs },
            Effect::StartPolling {
                feed: Feed::RunningCount
            },
        ]
    );
}

#[test]
fn each_read_replaces_the_collection() {
    init_logging();
    let state = session_with_view(View::Applications);

    let state = fetched(
        state,
        1,
        FeedData::Applications(vec![app(1, "prepared"), app(2, "shortlisted")]),
    );
    assert_eq!(state.applications().len(), 2);

    let state = fetched(state, 2, FeedData::Applications(vec![app(3, "applied")]));
    assert_eq!(state.applications(), &[app(3, "applied")]);

    let state = fetched(state, 3, FeedData::Applications(Vec::new()));
    assert!(state.applications().is_empty());
}

#[test]
fn stale_completion_does_not_overwrite_newer_read() {
    init_logging();
    let state = session_with_view(View::Applications);
    let state = fetched(state, 5, FeedData::Applications(vec![app(1, "submitted")]));
    let state = fetched(state, 4, FeedData::Applications(vec![app(1, "prepared")]));

    assert_eq!(state.applications(), &[app(1, "submitted")]);
}

#[test]
fn first_load_failure_is_reported_later_failures_are_silent() {
    init_logging();
    let mut state = session_with_view(View::Logs);
    state.drain_notifications();

    let (mut state, _) = update(
        state,
        Msg::FeedFailed {
            feed: Feed::Logs,
            seq: 1,
            explicit: false,
            failure: Failure::Message("connection refused".to_string()),
        },
    );
    let notes = state.drain_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert!(notes[0].text.contains("connection refused"));

    let state = fetched(state, 2, FeedData::Logs(vec![log(1, "running")]));
    let (mut state, _) = update(
        state,
        Msg::FeedFailed {
            feed: Feed::Logs,
            seq: 3,
            explicit: false,
            failure: Failure::Message("connection refused".to_string()),
        },
    );
    assert!(state.drain_notifications().is_empty());
    assert_eq!(state.logs(), &[log(1, "running")]);
}

#[test]
fn explicit_refresh_reports_its_failure() {
    init_logging();
    let state = session_with_view(View::Resumes);
    let mut state = fetched(state, 1, FeedData::Resumes(Vec::new()));
    state.drain_notifications();

    let (state, effects) = update(state, Msg::RefreshRequested(Feed::Resumes));
    assert_eq!(effects, vec![Effect::FetchOnce { feed: Feed::Resumes }]);

    let (mut state, _) = update(
        state,
        Msg::FeedFailed {
            feed: Feed::Resumes,
            seq: 2,
            explicit: true,
            failure: Failure::Message("bad gateway".to_string()),
        },
    );
    assert_eq!(state.drain_notifications().len(), 1);
}

#[test]
fn poll_failure_after_refresh_stays_silent_but_the_refresh_failure_is_shown() {
    init_logging();
    let state = session_with_view(View::Logs);
    let mut state = fetched(state, 1, FeedData::Logs(vec![log(1, "success")]));
    state.drain_notifications();

    let (state, _) = update(state, Msg::RefreshRequested(Feed::Logs));
    let (mut state, _) = update(
        state,
        Msg::FeedFailed {
            feed: Feed::Logs,
            seq: 2,
            explicit: false,
            failure: Failure::Message("connection refused".to_string()),
        },
    );
    assert!(state.drain_notifications().is_empty());

    let (mut state, _) = update(
        state,
        Msg::FeedFailed {
            feed: Feed::Logs,
            seq: 3,
            explicit: true,
            failure: Failure::Message("bad gateway".to_string()),
        },
    );
    let notes = state.drain_notifications();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].text.contains("bad gateway"));
    assert_eq!(state.logs(), &[log(1, "success")]);
}

#[test]
fn refresh_failure_is_shown_even_after_a_newer_poll_landed() {
    init_logging();
    let state = session_with_view(View::Logs);
    let state = fetched(state, 1, FeedData::Logs(Vec::new()));
    let (state, _) = update(state, Msg::RefreshRequested(Feed::Logs));
    let mut state = fetched(state, 3, FeedData::Logs(vec![log(2, "running")]));
    state.drain_notifications();

    let (mut state, _) = update(
        state,
        Msg::FeedFailed {
            feed: Feed::Logs,
            seq: 2,
            explicit: true,
            failure: Failure::Message("bad gateway".to_string()),
        },
    );
    assert_eq!(state.drain_notifications().len(), 1);
    assert_eq!(state.logs(), &[log(2, "running")]);
}

#[test]
fn running_indicator_keeps_only_running_entries() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SessionStarted);
    let state = fetched(
        state,
        1,
        FeedData::RunningTasks(vec![log(1, "running"), log(2, "success"), log(3, "RUNNING")]),
    );

    let ids: Vec<_> = state.running_tasks().iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn switching_views_releases_previous_feeds() {
    init_logging();
    let state = session_with_view(View::Logs);
    let state = fetched(state, 1, FeedData::RunningCount(3));

    let (state, effects) = update(state, Msg::ViewOpened(View::ColdMail));
    assert_eq!(
        effects,
        vec![
            Effect::StopPolling { feed: Feed::Logs },
            Effect::StopPolling {
                feed: Feed::RunningCount
            },
            Effect::StartPolling {
                feed: Feed::Contacts
            },
        ]
    );
    assert!(!state.is_polling(Feed::Logs));
    assert!(state.is_polling(Feed::RunningTasks));
    assert_eq!(state.running_count(), 0);

    // A read that lands after unmount is discarded.
    let state = fetched(state, 2, FeedData::RunningCount(9));
    assert_eq!(state.running_count(), 0);
}

#[test]
fn reopening_same_view_is_a_noop() {
    init_logging();
    let state = session_with_view(View::Scraper);
    let (_, effects) = update(state, Msg::ViewOpened(View::Scraper));
    assert!(effects.is_empty());
}

#[test]
fn unauthorized_read_expires_session_once() {
    init_logging();
    let mut state = session_with_view(View::Applications);
    state.drain_notifications();

    let (mut state, effects) = update(
        state,
        Msg::FeedFailed {
            feed: Feed::Applications,
            seq: 1,
            explicit: false,
            failure: Failure::Unauthorized,
        },
    );
    assert_eq!(state.session(), SessionState::Expired);
    assert_eq!(effects.len(), 2);
    assert!(effects
        .iter()
        .all(|effect| matches!(effect, Effect::StopPolling { .. })));
    assert_eq!(state.drain_notifications().len(), 1);

    let (mut state, effects) = update(
        state,
        Msg::FeedFailed {
            feed: Feed::RunningTasks,
            seq: 1,
            explicit: false,
            failure: Failure::Unauthorized,
        },
    );
    assert!(effects.is_empty());
    assert!(state.drain_notifications().is_empty());
}

#[test]
fn session_end_stops_everything() {
    init_logging();
    let state = session_with_view(View::Resumes);
    let (state, effects) = update(state, Msg::SessionEnded);

    assert_eq!(effects.len(), 2);
    assert_eq!(state.active_feeds().count(), 0);
    assert_eq!(state.current_view(), None);
}
