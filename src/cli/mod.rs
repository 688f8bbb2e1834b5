// Holler — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: ask, permit, status, serve.

mod commands;

use clap::{Parser, Subcommand};

pub use commands::execute;

use crate::server::{DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_PORT};

/// Seconds a caller waits for an answer before giving up.
pub const DEFAULT_ASK_TIMEOUT_SECS: u64 = 300;

/// Holler — notification broker for AI agents that need human input.
#[derive(Parser, Debug)]
#[command(name = "holler")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the human a question and block until it is answered.
    Ask {
        /// The question to ask.
        question: String,

        /// Additional context shown beneath the question.
        #[arg(long, short = 'c')]
        context: Option<String>,

        /// Name of the agent asking.
        #[arg(long, short = 'a')]
        agent: Option<String>,

        /// Description of what the agent is working on.
        #[arg(long, short = 't')]
        task: Option<String>,

        /// Seconds to wait for an answer before exiting non-zero.
        #[arg(long, default_value_t = DEFAULT_ASK_TIMEOUT_SECS)]
        timeout: u64,

        /// Broker port.
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Ask the human to approve or deny a specific command.
    /// Exits 0 on approval, 2 on denial, 1 on timeout or failure.
    Permit {
        /// What the agent wants to do, phrased as a question.
        question: String,

        /// The exact command awaiting approval.
        #[arg(long)]
        command: String,

        /// Additional context shown beneath the question.
        #[arg(long, short = 'c')]
        context: Option<String>,

        /// Name of the agent asking.
        #[arg(long, short = 'a')]
        agent: Option<String>,

        /// Description of what the agent is working on.
        #[arg(long, short = 't')]
        task: Option<String>,

        /// Seconds to wait for a decision before exiting non-zero.
        #[arg(long, default_value_t = DEFAULT_ASK_TIMEOUT_SECS)]
        timeout: u64,

        /// Broker port.
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Show the requests currently waiting for an answer.
    Status {
        /// Broker port.
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Run the broker in the foreground. Callers normally spawn this
    /// on demand; it exits by itself once idle.
    Serve {
        /// Port to bind on the loopback interface.
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Seconds without pending work before the broker exits.
        #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT_SECS)]
        idle_timeout: u64,
    },
}
