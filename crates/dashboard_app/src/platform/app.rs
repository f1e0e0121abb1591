use std::io::{self, BufRead};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use dashboard_core::{update, AppState, ContactId, Feed, Msg, NotificationLevel, View};
use dashboard_engine::{BatchDispatcher, EngineHandle, ReqwestApi, Session};
use engine_logging::{engine_debug, engine_info};
use log::LevelFilter;

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::render;
use crate::cli::{Cli, Command};

const PUMP_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(url) = cli.url {
        config.base_url = url;
    }

    let (destination, level) = if cli.verbose {
        (LogDestination::Both, LevelFilter::Debug)
    } else {
        (config.log_destination, LevelFilter::Info)
    };
    logging::initialize(destination, &config.log_file, level);

    match cli.command {
        Command::Login { token } => {
            config.token = Some(token);
            config.save(&cli.config)?;
            println!("Token saved to {}", cli.config.display());
            Ok(())
        }
        Command::Logout => {
            config.token = None;
            config.save(&cli.config)?;
            println!("Signed out.");
            Ok(())
        }
        command => {
            let mut app = App::connect(&config)?;
            if let Command::Watch { view, seconds } = command {
                let deadline =
                    seconds.and_then(|s| Instant::now().checked_add(Duration::from_secs(s)));
                app.watch(view.into(), deadline);
                app.dispatch(Msg::SessionEnded);
                return Ok(());
            }
            let failures = app.run_once(command, config.request_timeout());
            app.dispatch(Msg::SessionEnded);
            if failures > 0 {
                bail!("{failures} request(s) failed");
            }
            Ok(())
        }
    }
}

/// Owns the state loop: messages in, effects out to the engine.
struct App {
    state: AppState,
    runner: EffectRunner,
    last_frame: String,
}

impl App {
    fn connect(config: &AppConfig) -> Result<Self> {
        let token = config.token.clone();
        let api = ReqwestApi::new(
            config.client_settings()?,
            Session::new(token.clone().unwrap_or_default()),
        )?;
        let engine = EngineHandle::new(
            Arc::new(api),
            BatchDispatcher::new(config.concurrency()),
        );
        let mut app = Self {
            state: AppState::new(),
            runner: EffectRunner::new(engine, config.poll.clone()),
            last_frame: String::new(),
        };
        // Without a token the session stays idle and every action is refused.
        if token.is_some() {
            app.dispatch(Msg::SessionStarted);
        }
        Ok(app)
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.run(effects);
    }

    /// Feeds at most one engine event into the state loop.
    fn pump(&mut self, timeout: Duration) -> Option<Feed> {
        let msg = self.runner.next_msg(timeout)?;
        let read = match &msg {
            Msg::FeedFetched { feed, .. } | Msg::FeedFailed { feed, .. } => Some(*feed),
            _ => None,
        };
        self.dispatch(msg);
        read
    }

    /// Prints pending notifications and returns how many were errors.
    fn flush_notifications(&mut self) -> usize {
        let notes = self.state.drain_notifications();
        for note in &notes {
            println!("{}", render::render_notification(note));
        }
        notes
            .iter()
            .filter(|n| n.level == NotificationLevel::Error)
            .count()
    }

    fn redraw(&mut self) {
        if !self.state.consume_dirty() {
            return;
        }
        let frame = render::render(&self.state.view());
        if frame != self.last_frame {
            print!("{frame}");
            self.last_frame = frame;
        }
    }

    fn watch(&mut self, view: View, deadline: Option<Instant>) {
        self.dispatch(Msg::ViewOpened(view));
        let input = spawn_input_reader();
        println!("Commands: <view name>, r (refresh), q (quit)");

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            match input.try_recv() {
                Ok(line) => match parse_watch_command(&line) {
                    Some(WatchCommand::Quit) => break,
                    Some(WatchCommand::Refresh) => {
                        let feeds: Vec<Feed> = self.state.active_feeds().collect();
                        for feed in feeds {
                            self.dispatch(Msg::RefreshRequested(feed));
                        }
                    }
                    Some(WatchCommand::Open(view)) => self.dispatch(Msg::ViewOpened(view)),
                    None => println!("Unknown command: {}", line.trim()),
                },
                Err(mpsc::TryRecvError::Disconnected) if deadline.is_none() => break,
                Err(_) => {}
            }

            self.pump(PUMP_INTERVAL);
            self.flush_notifications();
            self.redraw();
        }
        engine_info!("watch finished");
    }

    /// Runs one command to completion and returns the number of errors shown.
    fn run_once(&mut self, command: Command, request_timeout: Duration) -> usize {
        let mut budget = wait_budget(request_timeout, 0);
        let msgs = match command {
            Command::SendMail {
                template,
                resume,
                contacts,
            } => {
                let contacts = dedup(contacts);
                budget = wait_budget(request_timeout, contacts.len());
                send_mail_msgs(template, resume, contacts)
            }
            Command::AutoApply { application } => {
                self.load_applications(request_timeout);
                vec![Msg::AutoApplyClicked(application)]
            }
            Command::SetStatus {
                application,
                status,
            } => {
                self.load_applications(request_timeout);
                vec![Msg::StatusChangeRequested {
                    application_id: application,
                    status,
                }]
            }
            Command::SyncInbox => vec![Msg::SyncInboxClicked],
            Command::StopAll => vec![Msg::StopAllClicked],
            Command::Scrape { url, target } => vec![Msg::ScraperRunRequested {
                target_url: url,
                target_type: target,
            }],
            Command::StopScrape => vec![Msg::ScraperStopClicked],
            Command::Login { .. } | Command::Logout | Command::Watch { .. } => Vec::new(),
        };

        for msg in msgs {
            self.dispatch(msg);
        }
        let started = Instant::now();
        while self.state.has_pending_work() && started.elapsed() < budget {
            self.pump(PUMP_INTERVAL);
        }
        if self.state.has_pending_work() {
            println!("[error] No answer from the server in time.");
            return self.flush_notifications() + 1;
        }
        self.flush_notifications()
    }

    /// Reads applications once so local checks (closed is final) have data.
    fn load_applications(&mut self, timeout: Duration) {
        self.dispatch(Msg::ViewOpened(View::Applications));
        let started = Instant::now();
        while started.elapsed() < timeout {
            if self.pump(PUMP_INTERVAL) == Some(Feed::Applications) {
                return;
            }
        }
        engine_debug!("applications not loaded before action");
    }
}

/// How long a one-shot command may wait for its answers: one request
/// timeout per item on top of a fixed grace period.
fn wait_budget(request_timeout: Duration, items: usize) -> Duration {
    let items = u32::try_from(items).unwrap_or(u32::MAX);
    request_timeout
        .saturating_mul(items)
        .saturating_add(request_timeout)
        .saturating_add(Duration::from_secs(5))
}

fn send_mail_msgs(template: u64, resume: u64, contacts: Vec<ContactId>) -> Vec<Msg> {
    let mut msgs = vec![
        Msg::TemplateSelected(Some(template)),
        Msg::ResumeSelected(Some(resume)),
    ];
    match contacts.as_slice() {
        [single] => msgs.push(Msg::DispatchMailClicked(*single)),
        many => {
            msgs.extend(many.iter().map(|id| Msg::ContactToggled(*id)));
            msgs.push(Msg::BatchDispatchClicked);
        }
    }
    msgs
}

fn dedup(ids: Vec<ContactId>) -> Vec<ContactId> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

#[derive(Debug, PartialEq, Eq)]
enum WatchCommand {
    Quit,
    Refresh,
    Open(View),
}

fn parse_watch_command(line: &str) -> Option<WatchCommand> {
    Some(match line.trim().to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => WatchCommand::Quit,
        "r" | "refresh" => WatchCommand::Refresh,
        "applications" | "apps" => WatchCommand::Open(View::Applications),
        "logs" => WatchCommand::Open(View::Logs),
        "cold-mail" | "coldmail" | "mail" => WatchCommand::Open(View::ColdMail),
        "scraper" => WatchCommand::Open(View::Scraper),
        "resumes" => WatchCommand::Open(View::Resumes),
        _ => return None,
    })
}

fn spawn_input_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_contact_uses_single_dispatch() {
        let msgs = send_mail_msgs(3, 9, vec![42]);
        assert_eq!(msgs.last(), Some(&Msg::DispatchMailClicked(42)));
    }

    #[test]
    fn several_contacts_are_selected_in_order_then_batched() {
        let msgs = send_mail_msgs(3, 9, dedup(vec![43, 41, 43, 42]));
        assert_eq!(
            msgs,
            vec![
                Msg::TemplateSelected(Some(3)),
                Msg::ResumeSelected(Some(9)),
                Msg::ContactToggled(43),
                Msg::ContactToggled(41),
                Msg::ContactToggled(42),
                Msg::BatchDispatchClicked,
            ]
        );
    }

    #[test]
    fn wait_budget_grows_per_item_and_never_overflows() {
        let timeout = Duration::from_secs(10);
        assert_eq!(wait_budget(timeout, 0), Duration::from_secs(15));
        assert_eq!(wait_budget(timeout, 3), Duration::from_secs(45));
        assert_eq!(wait_budget(Duration::MAX, 2), Duration::MAX);
        assert_eq!(wait_budget(Duration::from_secs(u64::MAX), 0), Duration::MAX);
    }

    #[test]
    fn watch_commands_parse() {
        assert_eq!(parse_watch_command(" Q "), Some(WatchCommand::Quit));
        assert_eq!(
            parse_watch_command("cold-mail"),
            Some(WatchCommand::Open(View::ColdMail))
        );
        assert_eq!(parse_watch_command("refresh"), Some(WatchCommand::Refresh));
        assert_eq!(parse_watch_command("dance"), None);
    }
}
