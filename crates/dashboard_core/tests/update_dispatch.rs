use std::sync::Once;

use dashboard_core::{
    update, Action, AppState, BatchSummary, Contact, DispatchPhase, Effect, Failure, Feed,
    FeedData, JobApplication, Msg, NotificationLevel, ScrapeTarget, View, WorkKey,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn contact(id: u64) -> Contact {
    Contact {
        id,
        email: format!("person{id}@example.com"),
        name: Some(format!("Person {id}")),
        role: None,
        company: Some("Initech".to_string()),
        source_url: None,
    }
}

fn app(id: u64, status: &str) -> JobApplication {
    JobApplication {
        id,
        status: status.to_string(),
        job_id: Some(7),
        resume_id: Some(1),
        job_title: Some("Backend Engineer".to_string()),
        company_name: Some("Acme".to_string()),
        application_type: None,
        notes: None,
    }
}

fn apply_all(state: AppState, msgs: Vec<Msg>) -> (AppState, Vec<Effect>) {
    let mut state = state;
    let mut effects = Vec::new();
    for msg in msgs {
        let (next, mut emitted) = update(state, msg);
        state = next;
        effects.append(&mut emitted);
    }
    (state, effects)
}

fn cold_mail_ready() -> AppState {
    let (mut state, _) = apply_all(
        AppState::new(),
        vec![
            Msg::SessionStarted,
            Msg::ViewOpened(View::ColdMail),
            Msg::FeedFetched {
                feed: Feed::Contacts,
                seq: 1,
                explicit: false,
                data: FeedData::Contacts(vec![contact(41), contact(42), contact(43)]),
            },
            Msg::TemplateSelected(Some(3)),
            Msg::ResumeSelected(Some(9)),
        ],
    );
    state.drain_notifications();
    state
}

#[test]
fn single_dispatch_failure_surfaces_detail_and_releases_row() {
    init_logging();
    let state = cold_mail_ready();

    let (state, effects) = update(state, Msg::DispatchMailClicked(42));
    let action = Action::DispatchMail {
        contact_id: 42,
        template_id: 3,
        resume_id: 9,
    };
    assert_eq!(effects, vec![Effect::Perform(action.clone())]);
    assert_eq!(state.phase(WorkKey::Contact(42)), DispatchPhase::Working);
    assert!(state.view().contacts[1].busy);
    // Other rows stay interactive.
    assert!(!state.view().contacts[0].busy);

    let (mut state, effects) = update(
        state,
        Msg::ActionSettled {
            action,
            reads_issued: 1,
            result: Err(Failure::Message("Invalid template".to_string())),
        },
    );
    assert!(effects.is_empty());
    let notes = state.drain_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert_eq!(notes[0].text, "Invalid template");
    assert_eq!(state.phase(WorkKey::Contact(42)), DispatchPhase::Idle);
    assert!(!state.view().contacts[1].busy);
}

#[test]
fn duplicate_click_while_working_is_ignored() {
    init_logging();
    let state = cold_mail_ready();
    let (state, first) = update(state, Msg::DispatchMailClicked(41));
    let (_state, second) = update(state, Msg::DispatchMailClicked(41));

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[test]
fn dispatch_requires_template_and_resume() {
    init_logging();
    let state = cold_mail_ready();
    let (state, _) = update(state, Msg::ResumeSelected(None));

    let (mut state, effects) = update(state, Msg::DispatchMailClicked(41));
    assert!(effects.is_empty());
    assert_eq!(
        state.drain_notifications()[0].text,
        "Select a template and resume first."
    );

    let (state, _) = update(state, Msg::ResumeSelected(Some(9)));
    let (mut state, effects) = update(state, Msg::BatchDispatchClicked);
    assert!(effects.is_empty());
    assert_eq!(state.drain_notifications()[0].text, "Select recipients first.");
    assert!(!state.batch_in_flight());
}

#[test]
fn batch_dispatches_selection_in_pick_order() {
    init_logging();
    let state = cold_mail_ready();
    let (state, effects) = apply_all(
        state,
        vec![
            Msg::ContactToggled(43),
            Msg::ContactToggled(41),
            Msg::ContactToggled(42),
            Msg::BatchDispatchClicked,
        ],
    );

    assert_eq!(
        effects,
        vec![Effect::DispatchBatch {
            contact_ids: vec![43, 41, 42],
            template_id: 3,
            resume_id: 9,
        }]
    );
    assert!(state.batch_in_flight());

    // The batch control stays disabled until the run settles.
    let (_state, effects) = update(state, Msg::BatchDispatchClicked);
    assert!(effects.is_empty());
}

#[test]
fn batch_settle_reports_counts_and_clears_selection() {
    init_logging();
    let state = cold_mail_ready();
    let (state, _) = apply_all(
        state,
        vec![
            Msg::AllContactsToggled,
            Msg::BatchDispatchClicked,
            Msg::BatchSettled {
                summary: BatchSummary {
                    accepted: vec![41, 43],
                    failed: vec![42],
                    unauthorized: false,
                },
                reads_issued: 1,
            },
        ],
    );
    let mut state = state;

    let notes = state.drain_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].text, "Batch Complete: 2 Sent, 1 Failed.");
    assert!(state.selection().is_empty());
    assert!(!state.batch_in_flight());
    assert_eq!(state.phase(WorkKey::Contact(41)), DispatchPhase::AwaitingPoll);
    assert_eq!(state.phase(WorkKey::Contact(42)), DispatchPhase::Idle);

    let (state, _) = update(
        state,
        Msg::FeedFetched {
            feed: Feed::Contacts,
            seq: 2,
            explicit: false,
            data: FeedData::Contacts(vec![contact(41), contact(42), contact(43)]),
        },
    );
    assert_eq!(
        state.phase(WorkKey::Contact(41)),
        DispatchPhase::ReflectedSuccess
    );
}

#[test]
fn sent_contact_settles_only_on_a_read_issued_after_the_accept() {
    init_logging();
    let (mut state, _) = apply_all(
        cold_mail_ready(),
        vec![
            Msg::DispatchMailClicked(42),
            Msg::ActionSettled {
                action: Action::DispatchMail {
                    contact_id: 42,
                    template_id: 3,
                    resume_id: 9,
                },
                reads_issued: 5,
                result: Ok(None),
            },
        ],
    );
    state.drain_notifications();
    assert_eq!(state.phase(WorkKey::Contact(42)), DispatchPhase::AwaitingPoll);

    // Issued while the send was still in flight; lands afterwards.
    let (state, _) = update(
        state,
        Msg::FeedFetched {
            feed: Feed::Contacts,
            seq: 4,
            explicit: false,
            data: FeedData::Contacts(vec![contact(41), contact(42), contact(43)]),
        },
    );
    assert_eq!(state.contacts().len(), 3);
    assert_eq!(state.phase(WorkKey::Contact(42)), DispatchPhase::AwaitingPoll);

    let (state, _) = update(
        state,
        Msg::FeedFetched {
            feed: Feed::Contacts,
            seq: 6,
            explicit: false,
            data: FeedData::Contacts(vec![contact(41), contact(42), contact(43)]),
        },
    );
    assert_eq!(
        state.phase(WorkKey::Contact(42)),
        DispatchPhase::ReflectedSuccess
    );
}

#[test]
fn toggle_all_clears_when_everything_is_selected() {
    init_logging();
    let state = cold_mail_ready();
    let (state, _) = update(state, Msg::AllContactsToggled);
    assert_eq!(state.selection().ids(), &[41, 42, 43]);

    let (state, _) = update(state, Msg::AllContactsToggled);
    assert!(state.selection().is_empty());
}

#[test]
fn auto_apply_badge_moves_only_on_a_later_read() {
    init_logging();
    let (state, _) = apply_all(
        AppState::new(),
        vec![
            Msg::SessionStarted,
            Msg::ViewOpened(View::Applications),
            Msg::FeedFetched {
                feed: Feed::Applications,
                seq: 1,
                explicit: false,
                data: FeedData::Applications(vec![app(5, "prepared")]),
            },
        ],
    );

    let (state, effects) = update(state, Msg::AutoApplyClicked(5));
    assert_eq!(
        effects,
        vec![Effect::Perform(Action::AutoApply { application_id: 5 })]
    );

    let (mut state, effects) = update(
        state,
        Msg::ActionSettled {
            action: Action::AutoApply { application_id: 5 },
            reads_issued: 1,
            result: Ok(Some("Autonomous Agent dispatched.".to_string())),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::FetchOnce {
            feed: Feed::Applications
        }]
    );
    assert_eq!(
        state.drain_notifications()[0].text,
        "Auto-Apply dispatched for Application #5. Check Logs for progress."
    );
    assert_eq!(state.view().applications[0].status.label, "Prepared");
    assert_eq!(state.phase(WorkKey::Application(5)), DispatchPhase::AwaitingPoll);

    // Same status on the next read: still waiting.
    let (state, _) = update(
        state,
        Msg::FeedFetched {
            feed: Feed::Applications,
            seq: 2,
            explicit: false,
            data: FeedData::Applications(vec![app(5, "prepared")]),
        },
    );
    assert_eq!(state.phase(WorkKey::Application(5)), DispatchPhase::AwaitingPoll);

    let (state, _) = update(
        state,
        Msg::FeedFetched {
            feed: Feed::Applications,
            seq: 3,
            explicit: false,
            data: FeedData::Applications(vec![app(5, "processing")]),
        },
    );
    let row = &state.view().applications[0];
    assert_eq!(row.status.label, "Processing");
    assert!(row.status.pulse);
    // Processing is not an outcome yet.
    assert_eq!(row.phase, DispatchPhase::AwaitingPoll);

    let (state, _) = update(
        state,
        Msg::FeedFetched {
            feed: Feed::Applications,
            seq: 4,
            explicit: false,
            data: FeedData::Applications(vec![app(5, "processing")]),
        },
    );
    assert_eq!(state.phase(WorkKey::Application(5)), DispatchPhase::AwaitingPoll);

    let (state, _) = update(
        state,
        Msg::FeedFetched {
            feed: Feed::Applications,
            seq: 5,
            explicit: false,
            data: FeedData::Applications(vec![app(5, "submitted")]),
        },
    );
    assert_eq!(
        state.phase(WorkKey::Application(5)),
        DispatchPhase::ReflectedSuccess
    );
}

#[test]
fn auto_apply_error_status_is_reflected_as_error() {
    init_logging();
    let (state, _) = apply_all(
        AppState::new(),
        vec![
            Msg::SessionStarted,
            Msg::ViewOpened(View::Applications),
            Msg::FeedFetched {
                feed: Feed::Applications,
                seq: 1,
                explicit: false,
                data: FeedData::Applications(vec![app(8, "prepared")]),
            },
            Msg::AutoApplyClicked(8),
            Msg::ActionSettled {
                action: Action::AutoApply { application_id: 8 },
                reads_issued: 1,
                result: Ok(None),
            },
            Msg::FeedFetched {
                feed: Feed::Applications,
                seq: 2,
                explicit: false,
                data: FeedData::Applications(vec![app(8, "processing")]),
            },
            Msg::FeedFetched {
                feed: Feed::Applications,
                seq: 3,
                explicit: false,
                data: FeedData::Applications(vec![app(8, "error")]),
            },
        ],
    );

    assert_eq!(state.phase(WorkKey::Application(8)), DispatchPhase::ReflectedError);
}

#[test]
fn closed_application_rejects_further_requests() {
    init_logging();
    let (mut state, _) = apply_all(
        AppState::new(),
        vec![
            Msg::SessionStarted,
            Msg::ViewOpened(View::Applications),
            Msg::FeedFetched {
                feed: Feed::Applications,
                seq: 1,
                explicit: false,
                data: FeedData::Applications(vec![app(2, "closed"), app(3, "applied")]),
            },
        ],
    );
    state.drain_notifications();

    let (mut state, effects) = update(
        state,
        Msg::StatusChangeRequested {
            application_id: 2,
            status: "shortlisted".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.drain_notifications()[0].text,
        "Application #2 is already closed."
    );

    let (_state, effects) = update(
        state,
        Msg::StatusChangeRequested {
            application_id: 3,
            status: " Closed ".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Perform(Action::UpdateStatus {
            application_id: 3,
            status: "closed".to_string(),
        })]
    );
}

#[test]
fn status_update_success_refreshes_applications() {
    init_logging();
    let (state, _) = apply_all(
        AppState::new(),
        vec![Msg::SessionStarted, Msg::ViewOpened(View::Applications)],
    );
    let action = Action::UpdateStatus {
        application_id: 3,
        status: "offer".to_string(),
    };
    let (state, _) = update(
        state,
        Msg::StatusChangeRequested {
            application_id: 3,
            status: "offer".to_string(),
        },
    );
    let (mut state, effects) = update(
        state,
        Msg::ActionSettled {
            action,
            reads_issued: 1,
            result: Ok(None),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::FetchOnce {
            feed: Feed::Applications
        }]
    );
    assert_eq!(
        state.drain_notifications()[0].text,
        "Application updated to OFFER"
    );
}

#[test]
fn scraper_run_validates_target_type() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SessionStarted);

    let (mut state, effects) = update(
        state,
        Msg::ScraperRunRequested {
            target_url: "https://jobs.example.com".to_string(),
            target_type: "people".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.drain_notifications()[0].text,
        "Invalid target type. Must be 'jobs' or 'contacts'."
    );

    let (_state, effects) = update(
        state,
        Msg::ScraperRunRequested {
            target_url: " https://jobs.example.com ".to_string(),
            target_type: "Jobs".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Perform(Action::RunScraper {
            target_url: "https://jobs.example.com".to_string(),
            target: ScrapeTarget::Jobs,
        })]
    );
}

#[test]
fn actions_need_an_active_session() {
    init_logging();
    let (mut state, effects) = update(AppState::new(), Msg::SyncInboxClicked);
    assert!(effects.is_empty());
    assert_eq!(state.drain_notifications()[0].level, NotificationLevel::Error);
    assert!(!state.has_pending_work());
}

#[test]
fn stop_all_refreshes_active_log_feeds() {
    init_logging();
    let (state, _) = apply_all(
        AppState::new(),
        vec![
            Msg::SessionStarted,
            Msg::ViewOpened(View::Logs),
            Msg::StopAllClicked,
        ],
    );
    assert!(state.is_working(WorkKey::StopAllTasks));

    let (mut state, effects) = update(
        state,
        Msg::ActionSettled {
            action: Action::StopAllTasks,
            reads_issued: 1,
            result: Ok(Some("Stopped 2 tasks.".to_string())),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::FetchOnce { feed: Feed::Logs },
            Effect::FetchOnce {
                feed: Feed::RunningCount
            },
            Effect::FetchOnce {
                feed: Feed::RunningTasks
            },
        ]
    );
    assert_eq!(state.drain_notifications()[0].text, "Stopped 2 tasks.");
    assert!(!state.has_pending_work());
}
