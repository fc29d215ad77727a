//! Interpreters for the supported technology stacks

pub mod code_inspection;
pub mod docker;
pub mod dotnet;
pub mod jhipster;
pub mod k8s;
pub mod node;
pub mod travis;
pub mod versioning;

use crate::interpret::RunCondition;
use std::sync::Arc;

pub use code_inspection::CodeInspectionInterpreter;
pub use docker::DockerInterpreter;
pub use dotnet::DotnetCoreInterpreter;
pub use jhipster::JHipsterInterpreter;
pub use k8s::K8sDeployInterpreter;
pub use node::{EslintInspection, NodeInterpreter};
pub use travis::{DelegateToTravisInterpreter, EmulateTravisInterpreter};
pub use versioning::{format_version, version_goal, VersionExecutor, VersionSource};

/// JHipster plans its own build and image; generic Node and Docker support stays out of the way
pub fn not_jhipster() -> RunCondition {
    Arc::new(|analysis| analysis.jhipster().is_none())
}
