use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "focusdeck",
    version,
    about = "Focus timer, stopwatch, Pomodoro and session history"
)]
pub struct Cli {
    /// Workspace holding config/, state/, logs/ and exports/.
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Register {
        username: String,
        password: String,
    },
    Login {
        username: String,
        password: String,
    },
    Logout,
    Whoami,
    History {
        #[command(subcommand)]
        command: Option<HistoryCommands>,
    },
    /// Count down and record the session once it is rated.
    Timer {
        #[arg(long, default_value_t = 0)]
        hours: u32,
        #[arg(long, default_value_t = 0)]
        minutes: u32,
        #[arg(long, default_value_t = 0)]
        seconds: u32,
        #[command(flatten)]
        record: RecordArgs,
    },
    /// Count up for a fixed number of seconds.
    Stopwatch {
        #[arg(long)]
        seconds: u64,
    },
    Pomodoro {
        #[arg(long)]
        focus: Option<u32>,
        #[arg(long)]
        short_break: Option<u32>,
        #[arg(long)]
        long_break: Option<u32>,
        #[arg(long)]
        rounds: Option<u32>,
        /// Stop after this many phases have completed.
        #[arg(long, default_value_t = 1)]
        phases: u32,
    },
    /// Sort plans given as `DAY HH:MM SUBJECT`.
    Plan {
        entries: Vec<String>,
        #[arg(long)]
        day: Option<String>,
    },
    Todo {
        items: Vec<String>,
        /// Positions (1-based, newest first) to mark as done.
        #[arg(long)]
        done: Vec<usize>,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommands {
    List,
    Delete {
        id: i64,
    },
    Export {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long)]
    pub rating: Option<u8>,
}
