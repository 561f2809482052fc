use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "GameTracker",
    about = "Gaming session tracker, schedule planner and performance analytics"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the API server and reminder scheduler in the foreground.
    Service,
    /// Start the service in the background unless it is already listening.
    Start,
    Status,
    Doctor,
    /// Run a single reminder sweep now.
    Remind,
    /// Schedule and playtime statistics.
    Stats,
    /// Planning advice for the current schedule.
    Advise,
    /// Current hardware readings and tuning advice.
    System,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}
