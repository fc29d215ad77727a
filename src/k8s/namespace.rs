/// Namespace for machine-managed deployments.
///
/// `sdm-testing-<workspace>` when `environment` mentions testing, else
/// `sdm-<workspace>`, always lower-cased.
pub fn namespace(workspace_id: &str, environment: &str) -> String {
    if environment.contains("testing") {
        format!("sdm-testing-{}", workspace_id).to_lowercase()
    } else {
        format!("sdm-{}", workspace_id).to_lowercase()
    }
}

/// Kubernetes-safe resource name: lower-case alphanumerics and `-`, at most 63 chars
pub fn valid_name(name: &str) -> String {
    let replaced: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    let trimmed = replaced.trim_matches('-');
    let mut truncated: String = trimmed.chars().take(63).collect();
    while truncated.ends_with('-') {
        truncated.pop();
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_testing() {
        assert_eq!(namespace("ABC123", "testing"), "sdm-testing-abc123");
        assert_eq!(namespace("ABC123", "gke-testing-int"), "sdm-testing-abc123");
    }

    #[test]
    fn test_namespace_default() {
        assert_eq!(namespace("ABC123", "sdm"), "sdm-abc123");
        assert_eq!(namespace("ABC123", "production"), "sdm-abc123");
    }

    #[test]
    fn test_valid_name() {
        assert_eq!(valid_name("My_Project.Web"), "my-project-web");
        assert_eq!(valid_name("--edge--"), "edge");
        assert_eq!(valid_name(&"a".repeat(80)).len(), 63);
    }
}
