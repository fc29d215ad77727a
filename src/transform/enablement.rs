use super::{CodeTransform, TransformParams};
use crate::notify::Notifier;
use crate::preference::{Enablement, EnablementTarget};
use crate::project::Project;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Switches the machine on for a freshly generated repository
pub struct SdmEnablementTransform {
    pub enablement: Enablement,
    pub sdm_name: String,
    pub notifier: Arc<dyn Notifier>,
}

#[async_trait]
impl CodeTransform for SdmEnablementTransform {
    fn name(&self) -> &str {
        "sdm-enablement"
    }

    async fn apply(&self, project: &Project, _params: &TransformParams) -> Result<()> {
        let id = project.id();
        self.enablement
            .toggle(
                &EnablementTarget::repo(&id.owner, &id.repo),
                true,
                &self.sdm_name,
                self.notifier.as_ref(),
            )
            .await
    }
}
