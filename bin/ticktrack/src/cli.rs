use clap::{Args, Parser, Subcommand};
use ticktrack_core::{CompletionFilter, SortOrder, StatusFilter};

/// ticktrack: track time spent on tasks.
#[derive(Debug, Parser)]
#[command(name = "ticktrack", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in by e-mail or user id.
    Login(LoginArgs),

    /// Forget the stored user.
    Logout,

    /// Show the logged-in user.
    Whoami,

    /// Create an account and log in with it.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Totals and the most recent tasks.
    Dashboard,

    /// List your tasks.
    Tasks(ListArgs),

    /// Work with a single task.
    #[command(subcommand)]
    Task(TaskCommand),

    /// Work with user accounts.
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// all, running or paused.
    #[arg(long, default_value_t = StatusFilter::All)]
    pub status: StatusFilter,

    /// all, completed or incomplete.
    #[arg(long, default_value_t = CompletionFilter::All)]
    pub completion: CompletionFilter,

    /// recent, oldest or time.
    #[arg(long, default_value_t = SortOrder::Recent)]
    pub sort: SortOrder,
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Create a task.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    Show { id: String },

    /// Change name or description.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    #[command(name = "rm")]
    Remove { id: String },

    /// Overwrite the tracked time (`HH:MM:SS`, `MM:SS` or seconds).
    SetTime { id: String, time: String },

    /// Pause a running task.  A paused task is tracked in the foreground,
    /// as with `track`, until Ctrl-C.
    Toggle { id: String },

    /// Mark as completed.
    Complete {
        id: String,
        /// Mark as not completed instead.
        #[arg(long)]
        undo: bool,
    },

    /// Run the timer in the foreground until Ctrl-C.
    Track { id: String },
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Show a user; defaults to yourself.
    Show { id: Option<String> },

    /// Look a user up by e-mail.
    Find { email: String },

    /// Update your profile.
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Delete your account and log out.
    #[command(name = "rm")]
    Remove {
        #[arg(long)]
        yes: bool,
    },
}
