use super::docker::DockerScanner;
use super::dotnet::DotnetCoreScanner;
use super::jhipster::JHipsterScanner;
use super::k8s::K8sScanner;
use super::node::NodeScanner;
use super::react::ReactScanner;
use super::scanner::TechnologyScanner;
use super::travis::TravisScanner;
use super::TechnologyId;
use std::collections::HashMap;
use std::sync::Arc;

/// Scanners in registration order, indexed by technology
pub struct StackRegistry {
    scanners: Vec<Arc<dyn TechnologyScanner>>,
    by_id: HashMap<TechnologyId, usize>,
}

impl StackRegistry {
    pub fn new() -> Self {
        Self {
            scanners: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Built-in scanners; React comes after Node because it reads Node's dependencies
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NodeScanner));
        registry.register(Arc::new(DotnetCoreScanner));
        registry.register(Arc::new(DockerScanner));
        registry.register(Arc::new(K8sScanner));
        registry.register(Arc::new(TravisScanner));
        registry.register(Arc::new(JHipsterScanner));
        registry.register(Arc::new(ReactScanner));
        registry
    }

    /// Add a scanner; a second scanner for the same technology replaces the first
    pub fn register(&mut self, scanner: Arc<dyn TechnologyScanner>) {
        let id = scanner.id();
        match self.by_id.get(&id) {
            Some(&index) => self.scanners[index] = scanner,
            None => {
                self.by_id.insert(id, self.scanners.len());
                self.scanners.push(scanner);
            }
        }
    }

    pub fn get(&self, id: &TechnologyId) -> Option<Arc<dyn TechnologyScanner>> {
        self.by_id.get(id).map(|&index| self.scanners[index].clone())
    }

    pub fn scanners(&self) -> &[Arc<dyn TechnologyScanner>] {
        &self.scanners
    }

    pub fn ids(&self) -> Vec<TechnologyId> {
        self.scanners.iter().map(|s| s.id()).collect()
    }
}

impl Default for StackRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let registry = StackRegistry::with_defaults();
        assert_eq!(
            registry.ids(),
            vec![
                TechnologyId::Node,
                TechnologyId::DotnetCore,
                TechnologyId::Docker,
                TechnologyId::K8s,
                TechnologyId::Travis,
                TechnologyId::JHipster,
                TechnologyId::React,
            ]
        );
        assert!(registry.get(&TechnologyId::Travis).is_some());
        assert!(registry.get(&TechnologyId::Custom("bun".into())).is_none());
    }

    #[test]
    fn test_replacing_scanner_keeps_position() {
        let mut registry = StackRegistry::with_defaults();
        registry.register(Arc::new(NodeScanner));
        assert_eq!(registry.scanners().len(), 7);
        assert_eq!(registry.ids()[0], TechnologyId::Node);
    }
}
