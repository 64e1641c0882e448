//! Target projection.
//!
//! Turns one merged module plus its discovered sources into the target
//! descriptors the emitter consumes: the primary target, one executable
//! per unit-test source, and an aggregate runner target when any unit
//! tests exist.

pub mod sources;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::descriptor::OutputKind;
use crate::merge::{LinkBucket, LinkRef, MergedModule, MergedSet};
use crate::util::fs::path_key;

pub use sources::{discover, SourceFilters, SourceGroup, SourceSet};

/// What a target builds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    Executable,
    StaticLib,
    SharedLib,
    /// Pseudo-target that runs every unit test of one module
    TestAggregate,
}

impl From<OutputKind> for TargetKind {
    fn from(output: OutputKind) -> Self {
        match output {
            OutputKind::Binary => TargetKind::Executable,
            OutputKind::StaticLib => TargetKind::StaticLib,
            OutputKind::DynamicLib => TargetKind::SharedLib,
        }
    }
}

/// One target, ready for emission.
#[derive(Debug, Clone, Serialize)]
pub struct TargetDescriptor {
    pub name: String,
    pub kind: TargetKind,

    /// Source groups, in emission order
    pub groups: Vec<SourceGroup>,

    /// Workspace-relative (or absolute) include directories
    pub include_dirs: BTreeSet<PathBuf>,

    pub libs: MergedSet<LinkRef>,
    pub system_libs: MergedSet<String>,

    pub has_pre_build: bool,
    pub has_post_build: bool,

    /// For a `TestAggregate`: unit-test target name -> its source file
    pub test_targets: BTreeMap<String, PathBuf>,
}

impl TargetDescriptor {
    fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        TargetDescriptor {
            name: name.into(),
            kind,
            groups: Vec::new(),
            include_dirs: BTreeSet::new(),
            libs: MergedSet::new(),
            system_libs: MergedSet::new(),
            has_pre_build: false,
            has_post_build: false,
            test_targets: BTreeMap::new(),
        }
    }
}

/// The unit-test target name for a test source file: sanitized
/// module-relative path segments with the test suffix stripped, prefixed
/// `test_`. `app/io/reader_test.cc` becomes `test_app_io_reader`.
pub fn test_target_name(test_source: &Path, test_suffix: &str) -> String {
    let stem = test_source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.strip_suffix(test_suffix).unwrap_or(&stem);

    let dir = test_source.parent().unwrap_or(Path::new(""));
    format!("test_{}", path_key(&dir.join(stem)))
}

/// Project one merged module into its targets.
///
/// The primary target comes first, then one executable per unit-test
/// source, then the aggregate runner (when any unit tests exist).
pub fn project_module(
    module: &MergedModule,
    sources: &SourceSet,
    filters: &SourceFilters,
    enable_unittest: bool,
) -> Vec<TargetDescriptor> {
    let mut include_dirs = module.include_dirs.clone();
    include_dirs.insert(PathBuf::from("sources").join(&module.name));

    let mut primary = TargetDescriptor::new(&module.name, TargetKind::from(module.output));
    primary.groups = sources.groups.clone();
    primary.include_dirs = include_dirs.clone();
    primary.libs = module.libs.clone();
    primary.system_libs = module.system_libs.clone();
    primary.has_pre_build = module.has_pre_build;
    primary.has_post_build = module.has_post_build;

    let mut targets = vec![primary];

    if !enable_unittest || sources.test_sources.is_empty() {
        return targets;
    }

    let is_binary = module.output == OutputKind::Binary;
    let reusable_groups = sources.reusable_groups();
    let mut test_names = BTreeMap::new();

    for test_source in &sources.test_sources {
        let name = test_target_name(test_source, &filters.test_suffix);

        let mut test = TargetDescriptor::new(&name, TargetKind::Executable);
        // An executable cannot be linked as a library, so a binary
        // module's tests compile its non-test sources directly instead.
        if is_binary {
            test.groups = reusable_groups.clone();
        }
        test.groups.push(SourceGroup {
            key: name.clone(),
            label: Some("ut_file".to_string()),
            files: vec![test_source.clone()],
        });
        test.include_dirs = include_dirs.clone();
        test.libs = module.libs.clone();
        test.system_libs = module.system_libs.clone();
        if !is_binary && !sources.head_only {
            test.libs
                .insert(LinkBucket::General, LinkRef::Target(module.name.clone()));
        }

        test_names.insert(name, test_source.clone());
        targets.push(test);
    }

    let mut aggregate = TargetDescriptor::new(
        format!("test_{}", module.name),
        TargetKind::TestAggregate,
    );
    aggregate.test_targets = test_names;
    targets.push(aggregate);

    targets
}
