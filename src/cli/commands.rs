// Holler — CLI Command Handlers
//
// Each function handles one CLI subcommand. `ask` and `permit` share the
// create-then-poll flow; only the interpretation of the answer differs.
// The broker never waits for a human; all waiting happens here.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::client::{ensure_broker, is_broker_running, BrokerClient};
use crate::error::HollerError;
use crate::notify::DesktopNotify;
use crate::server::protocol::AskPayload;
use crate::server::{self, ServeConfig};
use crate::store::{Decision, Request, RequestStore, RequestType};

use super::Commands;

/// Execute the parsed CLI command.
pub async fn execute(command: Commands) -> Result<(), HollerError> {
    match command {
        Commands::Ask {
            question,
            context,
            agent,
            task,
            timeout,
            port,
        } => {
            let payload = AskPayload {
                question: Some(question),
                context,
                agent,
                task,
                request_type: RequestType::Question,
                command: None,
            };
            cmd_ask(payload, timeout, port).await
        }
        Commands::Permit {
            question,
            command,
            context,
            agent,
            task,
            timeout,
            port,
        } => {
            let payload = AskPayload {
                question: Some(question),
                context,
                agent,
                task,
                request_type: RequestType::Permission,
                command: Some(command),
            };
            cmd_ask(payload, timeout, port).await
        }
        Commands::Status { port } => cmd_status(port).await,
        Commands::Serve { port, idle_timeout } => cmd_serve(port, idle_timeout).await,
    }
}

// ─── Ask / Permit ────────────────────────────────────────────────────────────

async fn cmd_ask(payload: AskPayload, timeout: u64, port: u16) -> Result<(), HollerError> {
    ensure_broker(port)?;

    let client = BrokerClient::new(port)?;
    let id = client.create(&payload).await?;
    eprintln!("holler: respond at {}", client.base_url());

    let answered = client
        .wait_for_answer(&id, Duration::from_secs(timeout))
        .await
        .ok_or(HollerError::Timeout)?;

    report_answer(&answered)
}

/// Turn the answered record into output and an exit status: plain answers
/// are printed, permission verdicts become exit codes.
fn report_answer(request: &Request) -> Result<(), HollerError> {
    match request.request_type {
        RequestType::Question => {
            println!("{}", request.answer.as_deref().unwrap_or_default());
            Ok(())
        }
        RequestType::Permission => match request.verdict() {
            Some(verdict) if verdict.decision == Decision::Approved => {
                if verdict.comment.is_empty() {
                    println!("approved");
                } else {
                    println!("approved: {}", verdict.comment);
                }
                Ok(())
            }
            Some(verdict) => Err(HollerError::Denied {
                comment: verdict.comment,
            }),
            // An answer that is not a verdict payload fails closed.
            None => Err(HollerError::Denied {
                comment: request.answer.clone().unwrap_or_default(),
            }),
        },
    }
}

// ─── Status ──────────────────────────────────────────────────────────────────

async fn cmd_status(port: u16) -> Result<(), HollerError> {
    if !is_broker_running(port) {
        println!("No broker running.");
        return Ok(());
    }

    let client = BrokerClient::new(port)?;
    let pending = client.pending().await?;

    if pending.is_empty() {
        println!("No pending requests.");
        return Ok(());
    }

    for request in &pending {
        let agent = request.agent.as_deref().unwrap_or("unknown");
        let age = (Utc::now() - request.created_at).num_seconds().max(0);
        println!("  [{agent}] ({age}s ago) {}", request.question);
    }

    Ok(())
}

// ─── Serve ───────────────────────────────────────────────────────────────────

async fn cmd_serve(port: u16, idle_timeout: u64) -> Result<(), HollerError> {
    let config = ServeConfig {
        port,
        idle_timeout_secs: idle_timeout,
    };
    let store = Arc::new(RequestStore::new());
    server::run(config, store, Arc::new(DesktopNotify)).await?;
    Ok(())
}
