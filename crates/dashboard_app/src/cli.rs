use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dashboard_core::{ApplicationId, ContactId, ResumeId, TemplateId, View};

/// Terminal client for the job-search automation backend
#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(version, about = "Watch and drive the job-search automation backend", long_about = None)]
pub struct Cli {
    /// Configuration file (created by `login`)
    #[arg(long = "config", global = true, default_value = "dashboard.ron")]
    pub config: PathBuf,

    /// Backend base URL (overrides config)
    #[arg(short = 'u', long = "url", global = true)]
    pub url: Option<String>,

    /// Also log to the terminal
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Store a bearer token (and the --url, if given) in the config file
    Login {
        #[arg(long = "token")]
        token: String,
    },
    /// Forget the stored token
    Logout,
    /// Poll a view and print it whenever it changes
    Watch {
        #[arg(value_enum, default_value = "applications")]
        view: ViewArg,
        /// Stop after this many seconds (default: until `q` or end of input)
        #[arg(long = "seconds")]
        seconds: Option<u64>,
    },
    /// Send outreach email to one or more contacts, in the given order
    SendMail {
        #[arg(long = "template")]
        template: TemplateId,
        #[arg(long = "resume")]
        resume: ResumeId,
        #[arg(required = true)]
        contacts: Vec<ContactId>,
    },
    /// Start the auto-apply agent for an application
    AutoApply { application: ApplicationId },
    /// Request a status transition for an application
    SetStatus {
        application: ApplicationId,
        status: String,
    },
    /// Start the inbox scanner
    SyncInbox,
    /// Stop every running background task
    StopAll,
    /// Start the scraper against a URL
    Scrape {
        url: String,
        /// What to collect: `jobs` or `contacts`
        #[arg(long = "target", default_value = "jobs")]
        target: String,
    },
    /// Stop the scraper
    StopScrape,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewArg {
    Applications,
    Logs,
    ColdMail,
    Scraper,
    Resumes,
}

impl From<ViewArg> for View {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::Applications => View::Applications,
            ViewArg::Logs => View::Logs,
            ViewArg::ColdMail => View::ColdMail,
            ViewArg::Scraper => View::Scraper,
            ViewArg::Resumes => View::Resumes,
        }
    }
}
