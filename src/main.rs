// Holler — Application Entry Point
//
// Parses CLI arguments, initializes structured logging, and dispatches to
// the command handler. Exit codes carry the caller contract: 0 for success
// or an approved permission, 2 for a denied permission, 1 for timeouts and
// failures.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use holler::cli::{execute, Cli};
use holler::HollerError;

#[tokio::main]
async fn main() {
    // RUST_LOG=holler=debug for verbose output; default is info.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("holler=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match execute(cli.command).await {
        Ok(()) => {}
        Err(HollerError::Denied { comment }) => {
            if comment.is_empty() {
                eprintln!("holler: permission denied");
            } else {
                eprintln!("holler: permission denied: {comment}");
            }
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("holler: {err}");
            std::process::exit(1);
        }
    }
}
