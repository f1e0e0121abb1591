//! Plain-text rendering of the view model.

use std::fmt::Write;

use dashboard_core::status::{Emphasis, StatusBadge};
use dashboard_core::{
    AppViewModel, ApplicationRow, ContactRow, DispatchPhase, LogRow, Notification,
    NotificationLevel, ResumeRow, SessionState, View,
};

pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(view));
    match view.view {
        Some(View::Applications) => {
            let _ = writeln!(out, "Prepared: {}", view.prepared_count);
            render_applications(&mut out, &view.applications);
        }
        Some(View::Logs) => {
            let _ = writeln!(out, "Running tasks: {}", view.running_count);
            render_logs(&mut out, &view.logs);
        }
        Some(View::ColdMail) => {
            let _ = writeln!(
                out,
                "Template: {}  Resume: {}  Selected: {}{}",
                opt_id(view.template_id),
                opt_id(view.resume_id),
                view.selected_count,
                if view.batch_in_flight { "  (sending batch)" } else { "" }
            );
            render_contacts(&mut out, &view.contacts);
        }
        Some(View::Scraper) => render_contacts(&mut out, &view.scraped_contacts),
        Some(View::Resumes) => render_resumes(&mut out, &view.resumes),
        None => {}
    }
    out
}

pub fn render_notification(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Info => "info",
        NotificationLevel::Success => "ok",
        NotificationLevel::Error => "error",
    };
    format!("[{tag}] {}", notification.text)
}

fn header(view: &AppViewModel) -> String {
    let session = match view.session {
        SessionState::Idle => "signed out",
        SessionState::Active => "connected",
        SessionState::Expired => "session expired",
    };
    let running = match view.running_tasks.len() {
        0 => String::new(),
        n => format!(" | {n} task(s) running"),
    };
    let title = view.view.map(view_title).unwrap_or("Dashboard");
    format!("== {title} ({session}){running} ==")
}

fn view_title(view: View) -> &'static str {
    match view {
        View::Applications => "Applications",
        View::Logs => "Logs",
        View::ColdMail => "Cold Mail",
        View::Scraper => "Scraper",
        View::Resumes => "Resumes",
    }
}

fn render_applications(out: &mut String, rows: &[ApplicationRow]) {
    if rows.is_empty() {
        let _ = writeln!(out, "  (no applications)");
        return;
    }
    for row in rows {
        let _ = writeln!(
            out,
            "  #{:<5} {:<16} {} @ {}{}",
            row.id,
            badge(&row.status),
            row.job_title,
            row.company_name,
            phase_suffix(row.phase, row.busy)
        );
        if let Some(notes) = row.notes.as_deref().filter(|n| !n.is_empty()) {
            let first = notes.lines().next().unwrap_or_default();
            let _ = writeln!(out, "         {first}");
        }
    }
}

fn render_logs(out: &mut String, rows: &[LogRow]) {
    if rows.is_empty() {
        let _ = writeln!(out, "  (no log entries)");
        return;
    }
    for row in rows {
        let _ = writeln!(
            out,
            "  {} {:<16} {:<14} {}",
            row.created_at.format("%Y-%m-%d %H:%M:%S"),
            badge(&row.status),
            row.action_type,
            row.message
        );
    }
}

fn render_contacts(out: &mut String, rows: &[ContactRow]) {
    if rows.is_empty() {
        let _ = writeln!(out, "  (no contacts)");
        return;
    }
    for row in rows {
        let mark = if row.selected { "[x]" } else { "[ ]" };
        let who = row.name.as_deref().unwrap_or("-");
        let role = match (row.role.as_deref(), row.company.as_deref()) {
            (Some(role), Some(company)) => format!("{role}, {company}"),
            (Some(role), None) => role.to_string(),
            (None, Some(company)) => company.to_string(),
            (None, None) => String::new(),
        };
        let _ = writeln!(
            out,
            "  {mark} #{:<5} {:<28} {:<20} {}{}",
            row.id,
            row.email,
            who,
            role,
            phase_suffix(row.phase, row.busy)
        );
    }
}

fn render_resumes(out: &mut String, rows: &[ResumeRow]) {
    if rows.is_empty() {
        let _ = writeln!(out, "  (no resumes)");
        return;
    }
    for row in rows {
        let _ = writeln!(
            out,
            "  #{:<5} {:<16} {}{}",
            row.id,
            badge(&row.status),
            row.filename,
            row.label
                .as_deref()
                .map(|label| format!(" ({label})"))
                .unwrap_or_default()
        );
    }
}

fn badge(badge: &StatusBadge) -> String {
    let marker = match badge.emphasis {
        Emphasis::Positive => "+",
        Emphasis::Negative => "!",
        Emphasis::Caution => "?",
        Emphasis::Progress | Emphasis::Info => "*",
        Emphasis::Muted | Emphasis::Neutral => " ",
    };
    let pulse = if badge.pulse { "~" } else { "" };
    format!("{marker}{}{pulse}", badge.label)
}

fn phase_suffix(phase: DispatchPhase, busy: bool) -> &'static str {
    if busy {
        return "  (working...)";
    }
    match phase {
        DispatchPhase::Idle => "",
        DispatchPhase::Working => "  (working...)",
        DispatchPhase::AwaitingPoll => "  (sent, waiting for update)",
        DispatchPhase::ReflectedSuccess => "  (done)",
        DispatchPhase::ReflectedError => "  (failed)",
    }
}

fn opt_id(id: Option<u64>) -> String {
    id.map(|id| format!("#{id}"))
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::status::application_badge;

    #[test]
    fn unknown_status_renders_raw_token() {
        assert_eq!(badge(&application_badge("mystery_status")), " mystery_status");
    }

    #[test]
    fn processing_badge_pulses() {
        let rendered = badge(&application_badge("processing"));
        assert!(rendered.ends_with('~'));
    }

    #[test]
    fn empty_view_says_so() {
        let view = AppViewModel {
            session: SessionState::Active,
            view: Some(View::Resumes),
            ..AppViewModel::default()
        };
        let text = render(&view);
        assert!(text.starts_with("== Resumes (connected) =="));
        assert!(text.contains("(no resumes)"));
    }

    #[test]
    fn notification_is_tagged_by_level() {
        let text = render_notification(&Notification {
            level: NotificationLevel::Error,
            text: "Invalid template".to_string(),
        });
        assert_eq!(text, "[error] Invalid template");
    }
}
