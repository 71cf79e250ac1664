use clap::{ArgGroup, Parser, Subcommand};

/// `trigger-desk` - Admin client for message trigger rules.
#[derive(Parser, Debug)]
#[command(name = "trigger-desk")]
#[command(version = "0.1.0")]
#[command(about = "Create message triggers and reset the development database.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the tags and messages a trigger can be built from
    Options {
        /// Print the option lists as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a trigger: when users respond to something, send a new message
    #[command(group(
        ArgGroup::new("trigger")
            .required(true)
            .args(["tag", "trigger_message"])
    ))]
    Create {
        /// Tag id whose tagged replies fire the trigger
        #[arg(long)]
        tag: Option<String>,

        /// Message id (unstructured reply) whose replies fire the trigger
        #[arg(long)]
        trigger_message: Option<String>,

        /// Message id to send when the trigger fires
        #[arg(short, long)]
        message: String,
    },

    /// Drop the trigger functions and every table of the database schema
    Nuke,

    /// Show the effective configuration
    Config,
}
