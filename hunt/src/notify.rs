//! Notifications shown to the player

use chrono::{DateTime, Utc};
use colored::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::error::{HuntError, Result};
use crate::waypoint::Hunt;

/// Title used on every notification
pub const APP_TITLE: &str = "Treasure Hunt";

/// Process-wide notification channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

static CHANNEL: OnceLock<NotificationChannel> = OnceLock::new();

/// Create the notification channel once per process.
///
/// Returns true only for the call that performed the setup.
pub fn setup_channel() -> bool {
    let mut created = false;
    CHANNEL.get_or_init(|| {
        created = true;
        info!("Notification channel created");
        NotificationChannel {
            id: "GeofenceChannel",
            name: "Treasure Hunt",
            description: "Treasure hunt progress",
        }
    });
    created
}

/// The channel, if `setup_channel` has run
pub fn channel() -> Option<&'static NotificationChannel> {
    CHANNEL.get()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Entered,
    Exited,
    Complete,
    UnknownTrigger,
}

/// A message for the player plus the index a tap should resume at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub text: String,
    pub waypoint_index: Option<usize>,
    pub resume_index: usize,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn build(kind: NotificationKind, text: String, waypoint_index: Option<usize>, resume_index: usize) -> Self {
        Self {
            kind,
            title: APP_TITLE.to_string(),
            text,
            waypoint_index,
            resume_index,
            created_at: Utc::now(),
        }
    }

    pub fn entered(hunt: &Hunt, waypoint_index: usize, resume_index: usize) -> Self {
        let name = hunt.get(waypoint_index).map(|wp| wp.name.as_str()).unwrap_or_default();
        Self::build(
            NotificationKind::Entered,
            format!("You have found the {}!", name),
            Some(waypoint_index),
            resume_index,
        )
    }

    pub fn exited(hunt: &Hunt, waypoint_index: usize, resume_index: usize) -> Self {
        let name = hunt.get(waypoint_index).map(|wp| wp.name.as_str()).unwrap_or_default();
        Self::build(
            NotificationKind::Exited,
            format!("You have left the {} area.", name),
            Some(waypoint_index),
            resume_index,
        )
    }

    pub fn complete(hunt: &Hunt) -> Self {
        Self::build(NotificationKind::Complete, hunt.final_message().to_string(), None, hunt.len())
    }

    pub fn unknown_trigger(trigger_id: &str, resume_index: usize) -> Self {
        Self::build(
            NotificationKind::UnknownTrigger,
            format!("Unknown region: {}", trigger_id),
            None,
            resume_index,
        )
    }
}

/// Delivers notifications to the player
pub trait Notifier {
    fn notify(&mut self, notification: Notification) -> Result<()>;
}

/// Prints notifications to a terminal
pub struct ConsoleNotifier<W: Write> {
    out: W,
}

impl ConsoleNotifier<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        setup_channel();
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for ConsoleNotifier<W> {
    fn notify(&mut self, notification: Notification) -> Result<()> {
        debug!(kind = ?notification.kind, resume_index = notification.resume_index, "ConsoleNotifier::notify");
        let marker = match notification.kind {
            NotificationKind::Entered => "✓".green(),
            NotificationKind::Exited => "←".yellow(),
            NotificationKind::Complete => "★".green().bold(),
            NotificationKind::UnknownTrigger => "✗".red(),
        };
        writeln!(
            self.out,
            "{} {}: {} {}",
            marker,
            notification.title.bold(),
            notification.text,
            format!("[resume {}]", notification.resume_index).dimmed()
        )
        .map_err(|e| HuntError::Notify(e.to_string()))
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Vec<Notification>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.sent.last()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent.iter().map(|n| n.kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notification: Notification) -> Result<()> {
        self.sent.push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_setup_channel_is_idempotent() {
        setup_channel();
        assert!(!setup_channel());
        assert_eq!(channel().unwrap().id, "GeofenceChannel");
    }

    #[test]
    fn test_notification_text() {
        let hunt = Hunt::default_hunt();

        let n = Notification::entered(&hunt, 1, 2);
        assert_eq!(n.kind, NotificationKind::Entered);
        assert_eq!(n.text, "You have found the Ferry Building!");
        assert_eq!(n.waypoint_index, Some(1));
        assert_eq!(n.resume_index, 2);

        let n = Notification::exited(&hunt, 2, 2);
        assert_eq!(n.text, "You have left the Pier 39 area.");

        let n = Notification::complete(&hunt);
        assert_eq!(n.resume_index, 4);
        assert_eq!(n.text, hunt.final_message());

        let n = Notification::unknown_trigger("bogus", 1);
        assert_eq!(n.text, "Unknown region: bogus");
        assert_eq!(n.waypoint_index, None);
    }

    #[test]
    #[serial]
    fn test_console_notifier_output() {
        colored::control::set_override(false);
        let hunt = Hunt::default_hunt();
        let mut notifier = ConsoleNotifier::new(Vec::new());
        notifier.notify(Notification::entered(&hunt, 0, 1)).unwrap();
        let out = String::from_utf8(notifier.into_inner()).unwrap();
        assert!(out.contains("Treasure Hunt: You have found the Golden Gate Bridge!"));
        assert!(out.contains("[resume 1]"));
    }

    #[test]
    fn test_recording_notifier() {
        let hunt = Hunt::default_hunt();
        let mut notifier = RecordingNotifier::new();
        notifier.notify(Notification::entered(&hunt, 0, 1)).unwrap();
        notifier.notify(Notification::complete(&hunt)).unwrap();
        assert_eq!(notifier.kinds(), vec![NotificationKind::Entered, NotificationKind::Complete]);
        assert_eq!(notifier.last().unwrap().kind, NotificationKind::Complete);
    }
}
