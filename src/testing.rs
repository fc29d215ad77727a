//! Fixtures shared by unit tests

use crate::fs::MockFileSystem;
use crate::pipeline::analysis::ProjectAnalysis;
use crate::preference::Preferences;
use crate::project::{Project, PushContext, RepoRef};
use crate::stack::scanner::{ScanContext, ScanOptions};
use std::sync::Arc;

pub fn project(files: &[(&str, &str)]) -> Project {
    named_project("widget", files)
}

pub fn named_project(name: &str, files: &[(&str, &str)]) -> Project {
    let fs = MockFileSystem::of(files.iter().copied());
    Project::new(RepoRef::new("acme", name), Arc::new(fs))
}

pub fn scan_context() -> ScanContext {
    ScanContext::new(Preferences::in_memory())
}

pub fn push(branch: &str) -> PushContext {
    PushContext::new(RepoRef::new("acme", "widget").with_branch(branch), branch, "main")
}

pub fn analysis(project: &Project) -> ProjectAnalysis {
    ProjectAnalysis::new(project.id().clone(), ScanOptions::full())
}
