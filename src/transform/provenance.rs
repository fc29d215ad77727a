use super::{CodeTransform, TransformParams};
use crate::project::Project;
use anyhow::Result;
use async_trait::async_trait;

pub const PROVENANCE_FILE: &str = ".provenance";

/// Records which seed and recipes produced a generated project
pub struct ProvenanceFile {
    pub sdm_name: String,
    pub seed_url: String,
    pub originators: Vec<String>,
}

impl ProvenanceFile {
    pub fn content(&self) -> String {
        let recipes: Vec<String> = self.originators.iter().map(|o| format!("\t{}", o)).collect();
        format!(
            "This project was created by {} from seed project {}\n\nTransform recipes:\n{}\n",
            self.sdm_name,
            self.seed_url,
            recipes.join("\n")
        )
    }
}

#[async_trait]
impl CodeTransform for ProvenanceFile {
    fn name(&self) -> &str {
        "provenance"
    }

    async fn apply(&self, project: &Project, _params: &TransformParams) -> Result<()> {
        project.add_file(PROVENANCE_FILE, &self.content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::project;

    #[tokio::test]
    async fn test_writes_provenance() {
        let p = project(&[]);
        let provenance = ProvenanceFile {
            sdm_name: "stackgoals".to_string(),
            seed_url: "https://github.com/acme/seed".to_string(),
            originators: vec!["node".to_string(), "environment-variables".to_string()],
        };
        provenance.apply(&p, &TransformParams::new()).await.unwrap();
        assert_eq!(
            p.get_file(PROVENANCE_FILE).unwrap(),
            "This project was created by stackgoals from seed project https://github.com/acme/seed\n\n\
             Transform recipes:\n\tnode\n\tenvironment-variables\n"
        );
    }
}
