//! Technology stacks: identifiers, typed elements and the scanners that detect them.
//!
//! Each scanner owns exactly one [`TechnologyId`] and produces at most one
//! [`TechnologyElement`] for it. Scanners run in registration order and may
//! read what earlier scanners found.

pub mod docker;
pub mod dotnet;
pub mod element;
pub mod jhipster;
pub mod k8s;
pub mod node;
pub mod react;
pub mod registry;
pub mod scanner;
pub mod technology_id;
pub mod travis;

pub use docker::{DockerScanner, DockerStack};
pub use dotnet::{DotnetCoreScanner, DotnetCoreStack};
pub use element::{Dependency, ServiceSpec, Services, TechnologyElement};
pub use jhipster::{JHipsterScanner, JHipsterStack, JvmBuildTool};
pub use k8s::{K8sScanner, K8sStack};
pub use node::{NodeScanner, NodeStack};
pub use react::{ReactScanner, ReactStack};
pub use registry::StackRegistry;
pub use scanner::{ScanContext, ScanOptions, TechnologyClassification, TechnologyScanner};
pub use technology_id::TechnologyId;
pub use travis::{TravisCi, TravisScanner};
