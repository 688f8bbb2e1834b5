// Holler — Broker launcher
//
// Lifecycle glue on the caller side: detect a running broker with a plain
// loopback connect, and spawn `holler serve` as a detached background
// process when there is none.

use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::HollerError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const STARTUP_POLL: Duration = Duration::from_millis(100);
const STARTUP_ATTEMPTS: u32 = 50;

/// True iff something accepts connections on the broker port.
pub fn is_broker_running(port: u16) -> bool {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok()
}

/// Make sure a broker is listening, spawning one detached if needed.
/// Waits up to a few seconds for the freshly spawned broker to bind.
pub fn ensure_broker(port: u16) -> Result<(), HollerError> {
    if is_broker_running(port) {
        return Ok(());
    }

    spawn_broker(port)?;

    for _ in 0..STARTUP_ATTEMPTS {
        if is_broker_running(port) {
            return Ok(());
        }
        std::thread::sleep(STARTUP_POLL);
    }
    Err(HollerError::Broker(format!(
        "broker did not start listening on port {port}"
    )))
}

/// Spawn `holler serve` re-using the current binary, detached from this
/// process's terminal and lifetime, with stdio routed to the void.
fn spawn_broker(port: u16) -> Result<(), HollerError> {
    let exe = std::env::current_exe()?;
    let mut command = Command::new(exe);
    command
        .arg("serve")
        .arg("--port")
        .arg(port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group: the broker outlives the caller's job control.
        command.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(DETACHED_PROCESS | CREATE_NO_WINDOW);
    }

    command.spawn()?;
    tracing::debug!(port, "spawned detached broker");
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
