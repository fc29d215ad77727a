//! Preference-backed machine settings: storage, enablement and deployment targets

pub mod deployment;
pub mod enablement;
pub mod store;

pub use deployment::{
    configure_deployment, get_deployment_mapping, show_deployment, ClusterAndNamespace,
    DeploymentError, DeploymentMapping, DeploymentPhase,
};
pub use enablement::{
    is_goal_enabled, toggle_goal_enablement, Enablement, EnablementState, EnablementTarget,
};
pub use store::{
    FilePreferenceStore, InMemoryPreferenceStore, PreferenceError, PreferenceScope,
    PreferenceStore, Preferences,
};
