//! Cross-configuration merge.
//!
//! Each axis contributes its resolved link requirements under its
//! configuration label; contributions from axes sharing a label are
//! unioned, never overwritten. Factoring then splits every set into the
//! three link buckets: what both labels need (General) and what only one
//! of them needs (Debug / Release).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::core::axis::Configuration;
use crate::core::descriptor::OutputKind;
use crate::graph::{post_order, BuildGraph};
use crate::resolve::ThirdPartyInfo;
use crate::util::diagnostic::{ComponentKind, GenerateError};

/// The three-way partition produced by the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkBucket {
    /// Required by every configuration
    General,
    /// Required only under DEBUG
    Debug,
    /// Required only under RELEASE
    Release,
}

impl LinkBucket {
    pub const ALL: [LinkBucket; 3] = [LinkBucket::General, LinkBucket::Debug, LinkBucket::Release];
}

/// One link reference: either another module's target or a file matched on
/// disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRef {
    /// A module target, linked by name
    Target(String),
    /// A resolved third-party file, workspace-relative
    File(PathBuf),
}

impl fmt::Display for LinkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkRef::Target(name) => f.write_str(name),
            LinkRef::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A set of link requirements split across the three buckets.
///
/// Values accumulate raw under their configuration label (Debug/Release
/// slots); [`factor`](MergedSet::factor) then moves the intersection into
/// General and leaves the differences behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergedSet<T: Ord> {
    general: BTreeSet<T>,
    debug: BTreeSet<T>,
    release: BTreeSet<T>,
}

impl<T: Ord + Clone> MergedSet<T> {
    pub fn new() -> Self {
        MergedSet {
            general: BTreeSet::new(),
            debug: BTreeSet::new(),
            release: BTreeSet::new(),
        }
    }

    /// Accumulate one value under a configuration label. Repeated
    /// contributions union.
    pub fn insert_raw(&mut self, label: Configuration, value: T) {
        match label {
            Configuration::Debug => self.debug.insert(value),
            Configuration::Release => self.release.insert(value),
        };
    }

    /// Accumulate many values under a configuration label.
    pub fn extend_raw(&mut self, label: Configuration, values: impl IntoIterator<Item = T>) {
        for value in values {
            self.insert_raw(label, value);
        }
    }

    /// The raw (unfactored) view of one label: General plus that label's
    /// bucket. Before factoring this is just the label's slot.
    pub fn raw_for(&self, label: Configuration) -> BTreeSet<T> {
        let mut result = self.general.clone();
        match label {
            Configuration::Debug => result.extend(self.debug.iter().cloned()),
            Configuration::Release => result.extend(self.release.iter().cloned()),
        }
        result
    }

    /// Insert directly into a bucket (used after factoring, e.g. to link a
    /// unit test against its module unconditionally).
    pub fn insert(&mut self, bucket: LinkBucket, value: T) {
        match bucket {
            LinkBucket::General => self.general.insert(value),
            LinkBucket::Debug => self.debug.insert(value),
            LinkBucket::Release => self.release.insert(value),
        };
    }

    /// Factor the common subset out of the per-label slots:
    /// `General = Debug ∩ Release`, then `Debug -= General`,
    /// `Release -= General`.
    pub fn factor(&mut self) {
        let common: BTreeSet<T> = self.debug.intersection(&self.release).cloned().collect();
        self.debug.retain(|v| !common.contains(v));
        self.release.retain(|v| !common.contains(v));
        self.general.extend(common);
    }

    pub fn get(&self, bucket: LinkBucket) -> &BTreeSet<T> {
        match bucket {
            LinkBucket::General => &self.general,
            LinkBucket::Debug => &self.debug,
            LinkBucket::Release => &self.release,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.general.is_empty() && self.debug.is_empty() && self.release.is_empty()
    }
}

/// A module collapsed across every axis of the run.
#[derive(Debug, Clone, Serialize)]
pub struct MergedModule {
    pub name: String,
    pub output: OutputKind,
    pub main_file: Option<PathBuf>,

    /// Workspace-relative include dirs contributed by referenced third
    /// parties (directly or transitively)
    pub include_dirs: BTreeSet<PathBuf>,

    pub libs: MergedSet<LinkRef>,
    pub system_libs: MergedSet<String>,
    pub has_pre_build: bool,
    pub has_post_build: bool,
}

/// A third party collapsed across every axis of the run.
#[derive(Debug, Clone, Serialize)]
pub struct MergedThirdParty {
    pub name: String,
    pub include_dirs: BTreeSet<PathBuf>,
    pub libs: MergedSet<PathBuf>,
    pub bins: MergedSet<PathBuf>,
    pub system_libs: MergedSet<String>,
}

/// The fully merged model, ready for projection.
#[derive(Debug, Serialize)]
pub struct MergedModel {
    pub modules: BTreeMap<String, MergedModule>,
    pub third_parties: BTreeMap<String, MergedThirdParty>,

    /// Post-order emission sequence over the union dependency relation:
    /// dependencies are emitted before their dependents.
    pub emission_order: Vec<String>,
}

/// Collapse per-axis graphs and third-party resolutions into one model.
///
/// `third_parties` is parallel to `graphs` (one resolved map per axis).
/// `head_only` names the modules that contribute no compiled artifact;
/// they are excluded from every dependent's link set.
pub fn merge_model(
    graphs: &[BuildGraph],
    third_parties: &[BTreeMap<String, ThirdPartyInfo>],
    head_only: &BTreeSet<String>,
) -> Result<MergedModel> {
    debug_assert_eq!(graphs.len(), third_parties.len());

    // Accumulate third parties raw across all axes first, so a module
    // assembled under any label sees the union of every same-label axis.
    let mut merged_third_parties: BTreeMap<String, MergedThirdParty> = BTreeMap::new();
    for (graph, resolved) in graphs.iter().zip(third_parties) {
        let label = graph.axis.configuration;
        for info in resolved.values() {
            let entry = merged_third_parties
                .entry(info.name.clone())
                .or_insert_with(|| MergedThirdParty {
                    name: info.name.clone(),
                    include_dirs: BTreeSet::new(),
                    libs: MergedSet::new(),
                    bins: MergedSet::new(),
                    system_libs: MergedSet::new(),
                });
            entry.include_dirs.extend(info.include_dirs.iter().cloned());
            entry
                .libs
                .extend_raw(label, info.matched_libs.iter().cloned());
            entry
                .bins
                .extend_raw(label, info.matched_bins.iter().cloned());
            entry
                .system_libs
                .extend_raw(label, info.system_libs.iter().cloned());
        }
    }

    // Every third-party reference must resolve to a known third party.
    for graph in graphs {
        for node in graph.modules.values() {
            for reference in &node.resolved_third_parties {
                if !merged_third_parties.contains_key(reference) {
                    return Err(GenerateError::MissingReference {
                        module: node.name.clone(),
                        kind: ComponentKind::ThirdParty,
                        reference: reference.clone(),
                    }
                    .into());
                }
            }
        }
    }

    // Emission order over the union of direct dependencies. Unioning
    // acyclic per-axis graphs can still produce a cycle; the traversal
    // rejects it.
    let mut union_children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for graph in graphs {
        for (name, node) in &graph.modules {
            union_children
                .entry(name.clone())
                .or_default()
                .extend(node.children.iter().cloned());
        }
    }
    let emission_order = post_order(union_children.keys().cloned(), |name| {
        union_children
            .get(name)
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default()
    })?;

    let mut merged_modules: BTreeMap<String, MergedModule> = BTreeMap::new();
    for name in &emission_order {
        let mut merged: Option<MergedModule> = None;

        for graph in graphs {
            let label = graph.axis.configuration;
            let Some(node) = graph.modules.get(name) else {
                continue;
            };

            let merged = merged.get_or_insert_with(|| MergedModule {
                name: node.name.clone(),
                output: node.output,
                main_file: node.main_file.clone(),
                include_dirs: BTreeSet::new(),
                libs: MergedSet::new(),
                system_libs: MergedSet::new(),
                has_pre_build: node.has_pre_build,
                has_post_build: node.has_post_build,
            });

            for dep in &node.resolved_dependencies {
                if !head_only.contains(dep) {
                    merged
                        .libs
                        .insert_raw(label, LinkRef::Target(dep.clone()));
                }
            }

            merged
                .system_libs
                .extend_raw(label, node.system_libs.iter().cloned());

            for tp_name in &node.resolved_third_parties {
                let tp = &merged_third_parties[tp_name];
                merged.include_dirs.extend(tp.include_dirs.iter().cloned());
                merged.libs.extend_raw(
                    label,
                    tp.libs.raw_for(label).into_iter().map(LinkRef::File),
                );
                merged
                    .system_libs
                    .extend_raw(label, tp.system_libs.raw_for(label));
            }
        }

        if let Some(merged) = merged {
            merged_modules.insert(name.clone(), merged);
        }
    }

    for module in merged_modules.values_mut() {
        module.libs.factor();
        module.system_libs.factor();
    }
    for tp in merged_third_parties.values_mut() {
        tp.libs.factor();
        tp.bins.factor();
        tp.system_libs.factor();
    }

    Ok(MergedModel {
        modules: merged_modules,
        third_parties: merged_third_parties,
        emission_order,
    })
}
