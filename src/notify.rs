//! Chat notification surface
//!
//! Commands report outcomes as structured [`Message`]s with optional
//! attachments and buttons. Markup helpers produce Slack-flavored text.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Plain,
    Info,
    Success,
    Warning,
    Error,
}

/// Button invoking a named command with parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub text: String,
    pub command: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Action {
    pub fn button(text: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            command: command.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub text: String,
    pub fallback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub title: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    fn new(kind: MessageKind, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            text: text.into(),
            actions: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Plain, "", text)
    }

    pub fn info(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(MessageKind::Info, title, text)
    }

    pub fn success(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(MessageKind::Success, title, text)
    }

    pub fn warning(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(MessageKind::Warning, title, text)
    }

    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, title, text)
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Sends messages to whoever invoked a command
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: Message) -> Result<()>;
}

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<Message>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<Message> {
        self.messages().pop()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: Message) -> Result<()> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message);
        Ok(())
    }
}

/// Writes messages to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: Message) -> Result<()> {
        match message.kind {
            MessageKind::Error => error!(title = %message.title, "{}", message.text),
            MessageKind::Warning => warn!(title = %message.title, "{}", message.text),
            _ => info!(title = %message.title, "{}", message.text),
        }
        for attachment in &message.attachments {
            info!(footer = ?attachment.footer, "  {}", attachment.text);
        }
        Ok(())
    }
}

/// Prints messages to stdout for command-line use
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// Plain-text rendering: title line, body, then attachments and buttons
    pub fn render(message: &Message) -> String {
        let marker = match message.kind {
            MessageKind::Plain => "",
            MessageKind::Info => "\u{2139} ",
            MessageKind::Success => "\u{2713} ",
            MessageKind::Warning => "\u{26A0} ",
            MessageKind::Error => "\u{2717} ",
        };
        let mut out = String::new();
        if !message.title.is_empty() {
            out.push_str(&format!("{}{}\n", marker, message.title));
        }
        out.push_str(&message.text);
        out.push('\n');
        for attachment in &message.attachments {
            out.push_str(&format!("  - {}", attachment.text));
            if let Some(footer) = &attachment.footer {
                out.push_str(&format!(" ({})", footer));
            }
            out.push('\n');
        }
        for action in message.actions.iter().chain(message.attachments.iter().flat_map(|a| a.actions.iter())) {
            out.push_str(&format!("  [{}] -> {}\n", action.text, action.command));
        }
        out
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, message: Message) -> Result<()> {
        print!("{}", Self::render(&message));
        Ok(())
    }
}

pub fn bold(text: &str) -> String {
    format!("*{}*", text)
}

pub fn italic(text: &str) -> String {
    format!("_{}_", text)
}

pub fn code_line(text: &str) -> String {
    format!("`{}`", text)
}

/// Link, labelled with the URL itself when `label` is `None`
pub fn url(target: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("<{}|{}>", target, label),
        None => format!("<{}>", target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup() {
        assert_eq!(bold("acme/widget"), "*acme/widget*");
        assert_eq!(italic("testing"), "_testing_");
        assert_eq!(code_line("node"), "`node`");
        assert_eq!(url("https://x.io", None), "<https://x.io>");
        assert_eq!(url("https://x.io", Some("x")), "<https://x.io|x>");
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier
            .send(Message::success("Seeds", "added").with_action(Action::button("Add Seed", "AddSeed")))
            .await
            .unwrap();
        notifier.send(Message::plain("hello")).await.unwrap();

        let messages = notifier.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].kind, MessageKind::Success);
        assert_eq!(messages[0].actions[0].command, "AddSeed");
        assert_eq!(notifier.last().unwrap().text, "hello");
    }

    #[test]
    fn test_console_rendering() {
        let message = Message::warning("Delete Repository", "Really delete acme/widget?")
            .with_action(Action::button("Delete", "DeleteRepo"));
        let rendered = ConsoleNotifier::render(&message);
        assert!(rendered.starts_with("\u{26A0} Delete Repository\n"));
        assert!(rendered.contains("Really delete acme/widget?"));
        assert!(rendered.contains("[Delete] -> DeleteRepo"));
    }

    #[test]
    fn test_action_parameters() {
        let action = Action::button("Remove Seed", "RemoveSeed").with_parameter("seedUrl", "https://github.com/a/b");
        assert_eq!(action.parameters.get("seedUrl").map(String::as_str), Some("https://github.com/a/b"));
    }
}
