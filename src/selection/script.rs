//! AppleScript runner and browser selection scripts.

use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use futures::future::BoxFuture;
use regex::Regex;
use tokio::process::Command;

use super::TextSelectionError;

const SELECTION_JS: &str = "window.getSelection().toString();";

/// Runs AppleScript source and returns its textual result.
pub trait ScriptRunner: Send + Sync {
    fn run<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<String, TextSelectionError>>;
}

/// Selection script for a browser, by bundle identifier.
pub fn browser_script_for(bundle_id: &str) -> Option<String> {
    match bundle_id {
        "com.apple.Safari" | "com.apple.SafariTechnologyPreview" => Some(format!(
            "tell application id \"{bundle_id}\"\n\
             \tdo JavaScript \"{SELECTION_JS}\" in current tab of front window\n\
             end tell"
        )),
        "com.google.Chrome"
        | "com.google.Chrome.canary"
        | "com.brave.Browser"
        | "com.microsoft.edgemac"
        | "com.vivaldi.Vivaldi" => Some(format!(
            "tell application id \"{bundle_id}\"\n\
             \texecute front window's active tab javascript \"{SELECTION_JS}\"\n\
             end tell"
        )),
        _ => None,
    }
}

/// Runs scripts through `osascript`.
#[derive(Debug, Clone)]
pub struct OsaScript {
    timeout: Duration,
}

impl OsaScript {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn execute(&self, source: &str) -> Result<String, TextSelectionError> {
        let child = Command::new("osascript")
            .arg("-e")
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| TextSelectionError::TimedOut {
                operation: "osascript",
            })?
            .map_err(|e| TextSelectionError::GenericError(format!("osascript: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let (code, message) = parse_error(&stderr);
            return Err(TextSelectionError::from_apple_script(code, message));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let text = text.strip_suffix('\n').unwrap_or(&text);
        if text.is_empty() {
            return Err(TextSelectionError::EmptyText);
        }
        Ok(text.to_string())
    }
}

impl ScriptRunner for OsaScript {
    fn run<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<String, TextSelectionError>> {
        Box::pin(self.execute(source))
    }
}

static ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+:\d+:\s*)?(?:(?:execution|syntax) error:\s*)?(?P<message>.*?)\s*(?:\((?P<code>-?\d+)\))?\s*$")
        .expect("static regex")
});

/// Split `osascript` stderr into the error number and message.
fn parse_error(stderr: &str) -> (Option<i64>, Option<String>) {
    let line = stderr.trim();
    let Some(caps) = ERROR_LINE.captures(line) else {
        return (None, None);
    };
    let code = caps.name("code").and_then(|c| c.as_str().parse().ok());
    let message = caps
        .name("message")
        .map(|m| m.as_str().trim().to_string())
        .filter(|m| !m.is_empty());
    (code, message)
}
