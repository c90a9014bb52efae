//! Best-effort operator alerts.
//!
//! A notification is sent before every terminal read so the operator knows a
//! caller is waiting. Delivery is purely advisory: whatever happens here, the
//! input flow continues unchanged. Two backends exist, a Windows toast shown by
//! PowerShell and `termux-notification` on other hosts; the backend is chosen
//! from the host at send time unless one has been injected.

use crate::config::Settings;
use crate::errors::NotificationError;
use crate::input::Notifier;
use crate::platform;
use crate::text::truncate_text;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

const TOAST_TITLE: &str = "Input Requested";
const TOAST_APP_ID: &str = "Copilot Interactive";
const TERMUX_TITLE: &str = "Input requested";
const TERMUX_PROGRAM: &str = "termux-notification";

/// A way of putting a message in front of the operator.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, content: &str) -> Result<(), NotificationError>;
}

/// Windows toast notification raised through PowerShell.
#[derive(Debug, Clone)]
pub struct WindowsToastBackend {
    program: PathBuf,
}

impl Default for WindowsToastBackend {
    fn default() -> Self {
        Self {
            program: PathBuf::from("powershell"),
        }
    }
}

impl WindowsToastBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn script(content: &str) -> String {
        // Single-quoted here-string: PowerShell performs no interpolation inside it.
        format!(
            r#"[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null
[Windows.Data.Xml.Dom.XmlDocument, Windows.Data.Xml.Dom.XmlDocument, ContentType = WindowsRuntime] | Out-Null
$template = @'
<toast>
    <visual>
        <binding template="ToastText02">
            <text id="1">{title}</text>
            <text id="2">{content}</text>
        </binding>
    </visual>
</toast>
'@
$xml = New-Object Windows.Data.Xml.Dom.XmlDocument
$xml.LoadXml($template)
$toast = [Windows.UI.Notifications.ToastNotification]::new($xml)
[Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('{app_id}').Show($toast)
"#,
            title = xml_escape(TOAST_TITLE),
            content = xml_escape(content),
            app_id = TOAST_APP_ID,
        )
    }
}

#[async_trait]
impl NotificationBackend for WindowsToastBackend {
    fn name(&self) -> &'static str {
        "windows-toast"
    }

    async fn send(&self, content: &str) -> Result<(), NotificationError> {
        let script = Self::script(content);
        run_command(
            &self.program,
            &["-NoProfile", "-NonInteractive", "-Command", script.as_str()],
        )
        .await
    }
}

/// `termux-notification` from the Termux:API add-on.
#[derive(Debug, Clone)]
pub struct TermuxBackend {
    program: PathBuf,
}

impl TermuxBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate the tool on `PATH`.
    pub fn detect() -> Option<Self> {
        which::which(TERMUX_PROGRAM).ok().map(Self::new)
    }

    async fn send_with_reply(&self, content: &str) -> Result<(), NotificationError> {
        run_command(
            &self.program,
            &[
                "--title",
                TERMUX_TITLE,
                "--content",
                content,
                "--input",
                "--input-label",
                "Reply",
            ],
        )
        .await
    }

    async fn send_plain(&self, content: &str) -> Result<(), NotificationError> {
        run_command(
            &self.program,
            &["--title", TERMUX_TITLE, "--content", content],
        )
        .await
    }
}

#[async_trait]
impl NotificationBackend for TermuxBackend {
    fn name(&self) -> &'static str {
        "termux"
    }

    async fn send(&self, content: &str) -> Result<(), NotificationError> {
        match self.send_with_reply(content).await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::debug!("Notification with inline reply failed ({}), sending plain", e);
                self.send_plain(content).await
            }
        }
    }
}

/// Pick the backend for the current host.
pub fn detect_backend() -> Result<Arc<dyn NotificationBackend>, NotificationError> {
    if platform::is_windows() {
        return Ok(Arc::new(WindowsToastBackend::default()));
    }
    TermuxBackend::detect()
        .map(|backend| Arc::new(backend) as Arc<dyn NotificationBackend>)
        .ok_or_else(|| NotificationError::ToolNotFound(TERMUX_PROGRAM.to_string()))
}

async fn run_command(program: &Path, args: &[&str]) -> Result<(), NotificationError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| NotificationError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(NotificationError::CommandFailed {
            program: program.display().to_string(),
            status: output.status.to_string(),
            stderr: if stderr.is_empty() {
                "unknown error".to_string()
            } else {
                stderr
            },
        })
    }
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Sends the "input requested" alert.
pub struct NotificationDispatcher {
    enabled: bool,
    max_content_length: usize,
    backend: Option<Arc<dyn NotificationBackend>>,
}

impl NotificationDispatcher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            enabled: settings.notification_enabled,
            max_content_length: settings.notification_max_content_length,
            backend: None,
        }
    }

    /// Use `backend` instead of detecting one from the host.
    pub fn with_backend(mut self, backend: Arc<dyn NotificationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Message body for a request with the given context. Context is hard-truncated.
    pub fn format_content(&self, context: Option<&str>) -> String {
        match context {
            Some(context) if !context.is_empty() => format!(
                "Input requested: {}",
                truncate_text(context, self.max_content_length, "")
            ),
            _ => "Input requested".to_string(),
        }
    }

    /// Alert the operator. Returns whether delivery succeeded; never fails.
    pub async fn notify(&self, context: Option<&str>) -> bool {
        if !self.enabled {
            log::debug!("Notifications are disabled");
            return false;
        }

        let backend = match &self.backend {
            Some(backend) => backend.clone(),
            None => match detect_backend() {
                Ok(backend) => backend,
                Err(e) => {
                    log::debug!("{}", e);
                    return false;
                }
            },
        };

        let content = self.format_content(context);
        match backend.send(&content).await {
            Ok(()) => {
                log::debug!("Sent {} notification", backend.name());
                true
            }
            Err(e) => {
                log::warn!("Failed to send {} notification: {}", backend.name(), e);
                false
            }
        }
    }
}

#[async_trait]
impl Notifier for NotificationDispatcher {
    async fn notify(&self, context: Option<&str>) -> bool {
        NotificationDispatcher::notify(self, context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBackend {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, content: &str) -> Result<(), NotificationError> {
            self.sent.lock().unwrap().push(content.to_string());
            if self.fail {
                Err(NotificationError::ToolNotFound("recording".into()))
            } else {
                Ok(())
            }
        }
    }

    fn dispatcher(settings: &Settings, backend: Arc<RecordingBackend>) -> NotificationDispatcher {
        NotificationDispatcher::new(settings).with_backend(backend)
    }

    #[test]
    fn test_format_content() {
        let settings = Settings::default().with_notification_max_content_length(10);
        let dispatcher = NotificationDispatcher::new(&settings);

        assert_eq!(dispatcher.format_content(None), "Input requested");
        assert_eq!(dispatcher.format_content(Some("")), "Input requested");
        assert_eq!(
            dispatcher.format_content(Some("short")),
            "Input requested: short"
        );
        assert_eq!(
            dispatcher.format_content(Some("Should I deploy to production now?")),
            "Input requested: Should I d"
        );
    }

    #[tokio::test]
    async fn test_disabled_dispatcher_never_sends() {
        let backend = Arc::new(RecordingBackend::default());
        let settings = Settings::default().with_notifications(false);
        let dispatcher = dispatcher(&settings, backend.clone());

        assert!(!dispatcher.notify(Some("anything")).await);
        assert!(backend.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_successful_delivery() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = dispatcher(&Settings::default(), backend.clone());

        assert!(dispatcher.notify(Some("Approve the migration?")).await);
        assert_eq!(
            backend.sent.lock().unwrap().as_slice(),
            ["Input requested: Approve the migration?"]
        );
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_false() {
        let backend = Arc::new(RecordingBackend {
            fail: true,
            ..Default::default()
        });
        let dispatcher = dispatcher(&Settings::default(), backend.clone());

        assert!(!dispatcher.notify(None).await);
        assert_eq!(backend.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_program_is_reported_as_spawn_error() {
        let backend = TermuxBackend::new("/nonexistent/termux-notification");
        let err = backend.send("hello").await.unwrap_err();
        assert!(matches!(err, NotificationError::Spawn { .. }));
    }

    #[test]
    fn test_toast_script_escapes_content() {
        let script = WindowsToastBackend::script("<b>rm -rf</b> & 'quotes' $env:PATH");
        assert!(script.contains("&lt;b&gt;rm -rf&lt;/b&gt; &amp; &apos;quotes&apos; $env:PATH"));
        assert!(script.contains("<text id=\"1\">Input Requested</text>"));
        assert!(script.contains("CreateToastNotifier('Copilot Interactive')"));
    }
}
