//! Autofixes, code inspections and review listeners contributed by interpreters

use crate::notify::{bold, code_line, Message, Notifier};
use crate::project::{Project, RepoRef};
use crate::transform::CodeTransform;
use anyhow::Result;
use async_trait::async_trait;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A transform run on every push, committing whatever it changes
#[derive(Clone)]
pub struct AutofixRegistration {
    pub name: String,
    pub transform: Arc<dyn CodeTransform>,
}

impl AutofixRegistration {
    pub fn new(transform: Arc<dyn CodeTransform>) -> Self {
        Self {
            name: transform.name().to_string(),
            transform,
        }
    }
}

impl fmt::Debug for AutofixRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutofixRegistration").field("name", &self.name).finish()
    }
}

impl Serialize for AutofixRegistration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AutofixRegistration", 1)?;
        state.serialize_field("name", &self.name)?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub category: String,
    pub severity: Severity,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReview {
    pub repo: RepoRef,
    pub comments: Vec<ReviewComment>,
}

impl ProjectReview {
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            comments: Vec::new(),
        }
    }

    /// Comments grouped by category, categories in name order
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&ReviewComment>> {
        let mut grouped: BTreeMap<&str, Vec<&ReviewComment>> = BTreeMap::new();
        for comment in &self.comments {
            grouped.entry(comment.category.as_str()).or_default().push(comment);
        }
        grouped
    }
}

#[async_trait]
pub trait CodeInspection: Send + Sync {
    fn name(&self) -> &str;

    async fn inspect(&self, project: &Project) -> Result<ProjectReview>;
}

#[derive(Clone)]
pub struct InspectionRegistration {
    pub name: String,
    pub inspection: Arc<dyn CodeInspection>,
}

impl InspectionRegistration {
    pub fn new(inspection: Arc<dyn CodeInspection>) -> Self {
        Self {
            name: inspection.name().to_string(),
            inspection,
        }
    }
}

impl fmt::Debug for InspectionRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectionRegistration").field("name", &self.name).finish()
    }
}

impl Serialize for InspectionRegistration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("InspectionRegistration", 1)?;
        state.serialize_field("name", &self.name)?;
        state.end()
    }
}

/// Receives the combined review once inspections have run
#[async_trait]
pub trait ReviewListener: Send + Sync {
    fn name(&self) -> &str;

    async fn on_review(&self, review: &ProjectReview) -> Result<()>;
}

impl fmt::Debug for dyn ReviewListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sends one message per comment category
pub struct NotifyingReviewListener {
    notifier: Arc<dyn Notifier>,
}

impl NotifyingReviewListener {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ReviewListener for NotifyingReviewListener {
    fn name(&self) -> &str {
        "notify-review"
    }

    async fn on_review(&self, review: &ProjectReview) -> Result<()> {
        for (category, comments) in review.by_category() {
            let lines: Vec<String> = comments
                .iter()
                .map(|c| match &c.source_location {
                    Some(location) => format!("{}: {}", code_line(&location.path), c.detail),
                    None => c.detail.clone(),
                })
                .collect();
            let title = format!("{} findings", category);
            let text = format!("{}\n{}", bold(&review.repo.slug()), lines.join("\n"));
            let worst = comments.iter().map(|c| c.severity).max();
            let message = match worst {
                Some(Severity::Error) => Message::error(title, text),
                Some(Severity::Warn) => Message::warning(title, text),
                _ => Message::info(title, text),
            };
            self.notifier.send(message).await?;
        }
        Ok(())
    }
}
