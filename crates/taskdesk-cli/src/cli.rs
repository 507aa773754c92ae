use clap::{Args, Parser, Subcommand, ValueEnum};

use taskdesk_core::models::{SortOrder, TodoFilter};

#[derive(Parser)]
#[command(name = "taskdesk")]
#[command(about = "Personal task list and account administration client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login {
        /// Login name (defaults to the last one used)
        #[arg(long, short = 'l')]
        login: Option<String>,
    },
    /// Create a new account
    Register(RegisterArgs),
    /// Sign out and forget stored credentials
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage your task list
    #[command(subcommand)]
    Todos(TodoCommand),
    /// Administer user accounts (admin only)
    #[command(subcommand)]
    Users(UserCommand),
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub login: String,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Subcommand)]
pub enum TodoCommand {
    /// List tasks
    List {
        #[arg(long, short = 'f', value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },
    /// Add a task
    Add { title: String },
    /// Mark a task as done
    Done { id: i64 },
    /// Mark a task as not done
    Undo { id: i64 },
    /// Change a task's title
    Rename { id: i64, title: String },
    /// Delete a task
    Delete { id: i64 },
    /// Keep listing tasks on an interval until interrupted
    Watch {
        #[arg(long, short = 'f', value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        /// Seconds between polls (defaults to the configured interval)
        #[arg(long, short = 'i')]
        interval: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// List accounts
    List(UserListArgs),
    /// Show one account
    Show { id: i64 },
    /// Change account details
    Edit {
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Replace an account's roles (e.g. ADMIN MODERATOR)
    Roles {
        id: i64,
        #[arg(required = true)]
        roles: Vec<String>,
    },
    /// Block an account
    Block { id: i64 },
    /// Unblock an account
    Unblock { id: i64 },
    /// Delete an account
    Delete { id: i64 },
}

#[derive(Args)]
pub struct UserListArgs {
    #[arg(long, short = 's')]
    pub search: Option<String>,
    #[arg(long)]
    pub sort_by: Option<String>,
    #[arg(long, value_enum)]
    pub sort_order: Option<OrderArg>,
    /// Only blocked (true) or only active (false) accounts
    #[arg(long)]
    pub blocked: Option<bool>,
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterArg {
    All,
    Completed,
    InWork,
}

impl From<FilterArg> for TodoFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => TodoFilter::All,
            FilterArg::Completed => TodoFilter::Completed,
            FilterArg::InWork => TodoFilter::InWork,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}
