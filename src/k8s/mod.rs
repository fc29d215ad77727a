//! Kubernetes support: cluster seam, namespaces, manifest fragments and application data

pub mod application;
pub mod client;
pub mod manifests;
pub mod namespace;

pub use application::{application_data, derive_route, HostRoute, KubernetesApplication};
pub use client::{Deployment, DeploymentClient, KubernetesCluster, RegistryCredential, StaticDeploymentClient};
pub use manifests::{image_pull_secret, mongo, mongo_for, K8sServiceRegistration, K8sServiceSpec};
pub use namespace::{namespace, valid_name};
