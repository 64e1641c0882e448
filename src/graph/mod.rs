//! Per-axis dependency graph and transitive closure.
//!
//! For each configuration axis the build model is an independent map of
//! module nodes. Closure computation walks the deterministic post-order
//! sequence once, forward: every direct child precedes its parents, so a
//! child's resolved sets are final by the time a parent unions them in.

pub mod traversal;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::Result;

use crate::core::axis::Axis;
use crate::core::descriptor::{ModuleDescriptor, OutputKind};
use crate::provider::DescriptorProvider;
use crate::util::diagnostic::{ComponentKind, GenerateError};

pub use traversal::post_order;

/// One module within one axis's graph.
///
/// Created once per (module, axis); the resolved sets are filled exactly
/// once during closure computation and never mutated afterward.
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub name: String,

    /// Direct dependencies, deduplicated
    pub children: BTreeSet<String>,

    /// Third parties referenced directly
    pub direct_third_parties: BTreeSet<String>,

    /// Transitive dependency closure (direct + inherited)
    pub resolved_dependencies: BTreeSet<String>,

    /// Transitive third-party closure (direct + inherited)
    pub resolved_third_parties: BTreeSet<String>,

    pub output: OutputKind,
    pub main_file: Option<PathBuf>,
    pub system_libs: BTreeSet<String>,
    pub has_pre_build: bool,
    pub has_post_build: bool,
}

impl ModuleNode {
    fn from_descriptor(descriptor: ModuleDescriptor) -> Self {
        ModuleNode {
            name: descriptor.name,
            children: descriptor.dependencies.into_iter().collect(),
            direct_third_parties: descriptor.third_parties.into_iter().collect(),
            resolved_dependencies: BTreeSet::new(),
            resolved_third_parties: BTreeSet::new(),
            output: descriptor.output,
            main_file: descriptor.main_file,
            system_libs: descriptor.system_libs.into_iter().collect(),
            has_pre_build: descriptor.pre_build.is_some(),
            has_post_build: descriptor.post_build.is_some(),
        }
    }
}

/// The dependency graph of one axis, after closure computation.
#[derive(Debug)]
pub struct BuildGraph {
    pub axis: Axis,
    pub modules: BTreeMap<String, ModuleNode>,
}

impl BuildGraph {
    /// Query the provider once per declared module, then compute the
    /// transitive closures. Fails on unknown dependency names and on
    /// dependency cycles.
    pub fn build(
        axis: Axis,
        module_names: &[String],
        provider: &dyn DescriptorProvider,
    ) -> Result<Self> {
        let mut modules = BTreeMap::new();
        for name in module_names {
            let descriptor = provider.describe_module(name, axis)?;
            modules.insert(name.clone(), ModuleNode::from_descriptor(descriptor));
        }

        let mut graph = BuildGraph { axis, modules };
        graph.resolve()?;
        Ok(graph)
    }

    /// Compute `resolved_dependencies` and `resolved_third_parties` for
    /// every node.
    fn resolve(&mut self) -> Result<()> {
        // Validate the reference universe up front so traversal only ever
        // sees known names.
        for node in self.modules.values() {
            for child in &node.children {
                if !self.modules.contains_key(child) {
                    return Err(GenerateError::MissingReference {
                        module: node.name.clone(),
                        kind: ComponentKind::Module,
                        reference: child.clone(),
                    }
                    .into());
                }
            }
        }

        let order = post_order(self.modules.keys().cloned(), |name| {
            self.modules
                .get(name)
                .map(|node| node.children.iter().cloned().collect())
                .unwrap_or_default()
        })?;

        for name in &order {
            // Children precede their parents in post order, so their
            // resolved sets are already complete.
            let mut dependencies: BTreeSet<String> = BTreeSet::new();
            let mut third_parties: BTreeSet<String> = BTreeSet::new();

            let node = &self.modules[name];
            dependencies.extend(node.children.iter().cloned());
            third_parties.extend(node.direct_third_parties.iter().cloned());

            for child in &node.children {
                let child_node = &self.modules[child];
                dependencies.extend(child_node.resolved_dependencies.iter().cloned());
                third_parties.extend(child_node.resolved_third_parties.iter().cloned());
            }

            let node = self.modules.get_mut(name).unwrap();
            node.resolved_dependencies = dependencies;
            node.resolved_third_parties = third_parties;
        }

        Ok(())
    }

    /// Every third-party name referenced anywhere in this graph.
    pub fn referenced_third_parties(&self) -> BTreeSet<String> {
        self.modules
            .values()
            .flat_map(|node| node.resolved_third_parties.iter().cloned())
            .collect()
    }
}

/// Check the cross-axis shape invariant: output kind, main file and hook
/// presence must be identical for a module in every axis of the run.
pub fn check_shape_consistency(graphs: &[BuildGraph]) -> Result<()> {
    let Some((first, rest)) = graphs.split_first() else {
        return Ok(());
    };

    for (name, reference) in &first.modules {
        for graph in rest {
            let Some(node) = graph.modules.get(name) else {
                continue;
            };
            let field = if node.output != reference.output {
                Some("output")
            } else if node.main_file != reference.main_file {
                Some("main-file")
            } else if node.has_pre_build != reference.has_pre_build {
                Some("pre-build")
            } else if node.has_post_build != reference.has_post_build {
                Some("post-build")
            } else {
                None
            };

            if let Some(field) = field {
                return Err(GenerateError::InconsistentShape {
                    module: name.clone(),
                    field,
                }
                .into());
            }
        }
    }

    Ok(())
}
