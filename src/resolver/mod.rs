//! Dependency resolution for test modules.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::error::OrchestratorError;
use crate::models::ModuleRef;

/// Orders modules so that each one follows all of its dependencies.
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyResolver;

impl DependencyResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Topologically sort `modules`.
    ///
    /// Dependencies naming a module outside the set are treated as already
    /// satisfied. A cycle fails the whole resolution; no partial order is
    /// returned.
    pub fn resolve(&self, modules: &[ModuleRef]) -> Result<Vec<ModuleRef>, OrchestratorError> {
        let by_name: HashMap<&str, &ModuleRef> =
            modules.iter().map(|m| (m.name(), m)).collect();

        let mut visiting = HashSet::new();
        let mut done = HashSet::new();
        let mut order = Vec::with_capacity(modules.len());

        for module in modules {
            visit(module, &by_name, &mut visiting, &mut done, &mut order)?;
        }

        Ok(order)
    }
}

fn visit<'a>(
    module: &'a ModuleRef,
    by_name: &HashMap<&'a str, &'a ModuleRef>,
    visiting: &mut HashSet<&'a str>,
    done: &mut HashSet<&'a str>,
    order: &mut Vec<ModuleRef>,
) -> Result<(), OrchestratorError> {
    let name = module.name();
    if done.contains(name) {
        return Ok(());
    }
    if !visiting.insert(name) {
        return Err(OrchestratorError::CircularDependency {
            module: name.to_string(),
        });
    }

    for dep in module.dependencies() {
        match by_name.get(dep.as_str()) {
            Some(&dependency) => visit(dependency, by_name, visiting, done, order)?,
            None => debug!("{} depends on unregistered module {}, skipping", name, dep),
        }
    }

    visiting.remove(name);
    done.insert(name);
    order.push(Arc::clone(module));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::SimulatedModule;

    fn module(name: &str, deps: &[&str]) -> ModuleRef {
        Arc::new(SimulatedModule::new(name).depends_on(deps.iter().copied()))
    }

    fn names(order: &[ModuleRef]) -> Vec<String> {
        order.iter().map(|m| m.name().to_string()).collect()
    }

    fn assert_topological(modules: &[ModuleRef], order: &[ModuleRef]) {
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name(), i))
            .collect();
        assert_eq!(order.len(), modules.len());
        for m in order {
            for dep in m.dependencies() {
                if let Some(dep_pos) = position.get(dep.as_str()) {
                    assert!(
                        *dep_pos < position[m.name()],
                        "{} scheduled before its dependency {}",
                        m.name(),
                        dep
                    );
                }
            }
        }
    }

    #[test]
    fn test_chain_is_reversed_into_dependency_order() {
        let modules = vec![
            module("ui", &["chat"]),
            module("chat", &["search"]),
            module("search", &[]),
        ];
        let order = DependencyResolver::new().resolve(&modules).unwrap();
        assert_eq!(names(&order), vec!["search", "chat", "ui"]);
    }

    #[test]
    fn test_diamond_respects_transitive_dependencies() {
        let modules = vec![
            module("report", &["left", "right"]),
            module("left", &["base"]),
            module("right", &["base"]),
            module("base", &[]),
            module("standalone", &[]),
        ];
        let order = DependencyResolver::new().resolve(&modules).unwrap();
        assert_topological(&modules, &order);
        assert_eq!(order[0].name(), "base");
        assert_eq!(order.last().unwrap().name(), "standalone");
    }

    #[test]
    fn test_independent_modules_keep_input_order() {
        let modules = vec![module("b", &[]), module("a", &[]), module("c", &[])];
        let order = DependencyResolver::new().resolve(&modules).unwrap();
        assert_eq!(names(&order), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_unknown_dependency_is_skipped() {
        let modules = vec![module("api", &["does-not-exist"]), module("ui", &["api"])];
        let order = DependencyResolver::new().resolve(&modules).unwrap();
        assert_eq!(names(&order), vec!["api", "ui"]);
    }

    #[test]
    fn test_three_node_cycle_fails() {
        let modules = vec![
            module("a", &["b"]),
            module("b", &["c"]),
            module("c", &["a"]),
        ];
        let err = DependencyResolver::new().resolve(&modules).err().unwrap();
        assert_eq!(
            err,
            OrchestratorError::CircularDependency {
                module: "a".to_string()
            }
        );
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let modules = vec![module("loop", &["loop"])];
        let err = DependencyResolver::new().resolve(&modules).err().unwrap();
        assert!(matches!(err, OrchestratorError::CircularDependency { module } if module == "loop"));
    }

    #[test]
    fn test_empty_set() {
        let order = DependencyResolver::new().resolve(&[]).unwrap();
        assert!(order.is_empty());
    }
}
