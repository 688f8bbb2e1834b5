// Holler — Desktop notifications
//
// Native OS notifications via subprocess calls: notify-send on Linux,
// osascript on macOS, a PowerShell toast on Windows. Values are passed as
// argv entries or environment variables, never interpolated into a shell
// line, and sanitized to a conservative whitelist first.

use std::process::{Command, Stdio};

use super::Notify;

const MAX_BODY_CHARS: usize = 120;

pub struct DesktopNotify;

impl Notify for DesktopNotify {
    fn notify(&self, question: &str, agent: Option<&str>, url: &str) {
        let title = match agent {
            Some(agent) => format!("holler: {}", sanitize(agent)),
            None => "holler".to_string(),
        };
        let body = clip_body(&sanitize(question));

        let sent = if cfg!(target_os = "linux") {
            notify_linux(&title, &body)
        } else if cfg!(target_os = "macos") {
            notify_macos(&title, &body)
        } else if cfg!(target_os = "windows") {
            notify_windows(&title, &body, url)
        } else {
            false
        };

        if !sent {
            eprintln!("*** {title}: {body}");
            eprintln!("*** Respond at: {url}");
        }
    }
}

/// Keep word characters, whitespace, and minimal punctuation. Everything
/// shell- or markup-significant (quotes, backticks, `$`, `&`, `<`, `>`)
/// is stripped before the text leaves this process.
fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            c.is_alphanumeric()
                || c.is_whitespace()
                || matches!(c, '_' | '-' | '.' | ',' | '?' | ':' | '(' | ')')
        })
        .collect()
}

fn clip_body(body: &str) -> String {
    if body.chars().count() > MAX_BODY_CHARS {
        let clipped: String = body.chars().take(MAX_BODY_CHARS - 3).collect();
        format!("{clipped}...")
    } else {
        body.to_string()
    }
}

fn notify_linux(title: &str, body: &str) -> bool {
    run_quiet(
        Command::new("notify-send")
            .arg(title)
            .arg(body)
            .arg("--app-name=holler"),
    )
}

fn notify_macos(title: &str, body: &str) -> bool {
    // Values travel via the environment so osascript never sees them as code.
    let script = r#"display notification (system attribute "HOLLER_BODY") with title (system attribute "HOLLER_TITLE")"#;
    run_quiet(
        Command::new("osascript")
            .arg("-e")
            .arg(script)
            .env("HOLLER_TITLE", title)
            .env("HOLLER_BODY", body),
    )
}

fn notify_windows(title: &str, body: &str, url: &str) -> bool {
    let script = format!(
        r#"
[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null
[Windows.Data.Xml.Dom.XmlDocument, Windows.Data.Xml.Dom, ContentType = WindowsRuntime] | Out-Null

$template = @"
<toast activationType="protocol" launch="{url}">
    <visual>
        <binding template="ToastGeneric">
            <text>{title}</text>
            <text>{body}</text>
        </binding>
    </visual>
    <audio silent="false"/>
</toast>
"@

$xml = New-Object Windows.Data.Xml.Dom.XmlDocument
$xml.LoadXml($template)
$toast = [Windows.UI.Notifications.ToastNotification]::new($xml)
$notifier = [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier("holler")
$notifier.Show($toast)
"#,
        url = xml_escape(url),
        title = xml_escape(title),
        body = xml_escape(body),
    );
    run_quiet(Command::new("powershell").arg("-NoProfile").arg("-Command").arg(script))
}

fn run_quiet(command: &mut Command) -> bool {
    command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
