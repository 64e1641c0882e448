//! Module source discovery.
//!
//! Walks a module's source tree and buckets the files the way the emitted
//! build file groups them: one group per subdirectory, a dedicated group
//! for the binary entry point, and one for the descriptor file. Unit-test
//! sources (`*_test.<ext>`) are collected separately and excluded from the
//! primary target.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::core::descriptor::OutputKind;
use crate::core::layout::{Layout, DESCRIPTOR_FILE};
use crate::util::fs::path_key;

/// File classification rules. One set per run, threaded through
/// explicitly.
#[derive(Debug, Clone)]
pub struct SourceFilters {
    /// Header-category extensions
    pub head_extensions: Vec<String>,

    /// Compiled-category extensions
    pub source_extensions: Vec<String>,

    /// Stem suffix marking a unit-test source
    pub test_suffix: String,
}

impl Default for SourceFilters {
    fn default() -> Self {
        SourceFilters {
            head_extensions: ["h", "hpp", "inl", "hh"]
                .map(String::from)
                .to_vec(),
            source_extensions: ["cc", "cpp", "c", "cxx", "cp", "c++"]
                .map(String::from)
                .to_vec(),
            test_suffix: "_test".to_string(),
        }
    }
}

impl SourceFilters {
    fn extension_of(path: &Path) -> Option<String> {
        path.extension().map(|e| e.to_string_lossy().into_owned())
    }

    pub fn is_head(&self, path: &Path) -> bool {
        Self::extension_of(path)
            .map(|ext| self.head_extensions.contains(&ext))
            .unwrap_or(false)
    }

    pub fn is_source(&self, path: &Path) -> bool {
        Self::extension_of(path)
            .map(|ext| self.source_extensions.contains(&ext))
            .unwrap_or(false)
    }

    /// Whether the file's stem carries the unit-test suffix.
    pub fn has_test_suffix(&self, path: &Path) -> bool {
        path.file_stem()
            .map(|stem| {
                stem.to_string_lossy()
                    .ends_with(&self.test_suffix)
            })
            .unwrap_or(false)
    }
}

/// One named group of source files. Files are relative to the sources
/// directory. Groups without a label get no IDE source-group entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceGroup {
    pub key: String,
    pub label: Option<String>,
    pub files: Vec<PathBuf>,
}

/// Everything discovered for one module.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub groups: Vec<SourceGroup>,

    /// Key of the entry-point group, when present. Excluded from
    /// unit-test builds.
    pub main_group: Option<String>,

    /// Key of the descriptor-file group. Excluded from unit-test builds.
    pub descriptor_group: Option<String>,

    /// Unit-test sources, relative to the sources directory
    pub test_sources: Vec<PathBuf>,

    /// True when no discovered file is compiled-category: the module
    /// contributes include dirs but no linkable artifact.
    pub head_only: bool,
}

impl SourceSet {
    /// The groups a unit-test target may reuse (everything except the
    /// entry point and the descriptor file).
    pub fn reusable_groups(&self) -> Vec<SourceGroup> {
        self.groups
            .iter()
            .filter(|group| {
                Some(&group.key) != self.main_group.as_ref()
                    && Some(&group.key) != self.descriptor_group.as_ref()
            })
            .cloned()
            .collect()
    }
}

/// The IDE source-group label for a subdirectory (`sources`, or
/// `sources\\sub\\dir` using the escaped-backslash convention the build
/// tool expects).
fn group_label(sub_dir: &Path) -> String {
    if sub_dir.as_os_str().is_empty() {
        return "sources".to_string();
    }
    let mut parts = vec!["sources".to_string()];
    parts.extend(
        sub_dir
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("\\\\")
}

/// The group key for a subdirectory of the module.
fn group_key(module: &str, sub_dir: &Path) -> String {
    if sub_dir.as_os_str().is_empty() {
        return module.to_string();
    }
    path_key(&Path::new(module).join(sub_dir))
}

/// Walk one module's tree and classify its files.
pub fn discover(
    layout: &Layout,
    module: &str,
    output: OutputKind,
    main_file: Option<&Path>,
    filters: &SourceFilters,
) -> SourceSet {
    let module_dir = layout.module_dir(module);
    // The entry point only matters for binaries; for libraries a declared
    // main file stays an ordinary source.
    let main_file = (output == OutputKind::Binary)
        .then_some(main_file)
        .flatten();
    let rel_main = main_file.map(|main| Path::new(module).join(main));

    // dir (relative to the module) -> files (relative to the sources dir)
    let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    let mut test_sources = Vec::new();

    for entry in WalkDir::new(&module_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !filters.is_head(path) && !filters.is_source(path) {
            continue;
        }

        let rel_to_module = path.strip_prefix(&module_dir).unwrap_or(path).to_path_buf();
        let rel_to_sources = Path::new(module).join(&rel_to_module);

        if Some(&rel_to_sources) == rel_main.as_ref() {
            // The entry point gets its own group below.
            continue;
        }
        if filters.has_test_suffix(path) {
            if filters.is_source(path) {
                test_sources.push(rel_to_sources);
            }
            continue;
        }

        let sub_dir = rel_to_module.parent().unwrap_or(Path::new("")).to_path_buf();
        by_dir.entry(sub_dir).or_default().push(rel_to_sources);
    }

    let mut set = SourceSet::default();
    for (sub_dir, mut files) in by_dir {
        files.sort();
        set.groups.push(SourceGroup {
            key: group_key(module, &sub_dir),
            label: Some(group_label(&sub_dir)),
            files,
        });
    }

    // Entry-point group, tracked separately so unit-test builds can omit
    // it.
    if output == OutputKind::Binary {
        match (main_file, rel_main) {
            (Some(main), Some(rel_main)) if module_dir.join(main).is_file() => {
                let key = format!("main_file_{}", module);
                set.groups.push(SourceGroup {
                    key: key.clone(),
                    label: Some(group_label(main.parent().unwrap_or(Path::new("")))),
                    files: vec![rel_main],
                });
                set.main_group = Some(key);
            }
            _ => {
                tracing::warn!("binary module `{}` has no resolvable main file", module);
            }
        }
    }

    // Descriptor file group, for IDE visibility only.
    if module_dir.join(DESCRIPTOR_FILE).is_file() {
        let key = format!("{}_build_descriptor", module);
        set.groups.push(SourceGroup {
            key: key.clone(),
            label: None,
            files: vec![Path::new(module).join(DESCRIPTOR_FILE)],
        });
        set.descriptor_group = Some(key);
    }

    test_sources.sort();
    set.test_sources = test_sources;

    set.head_only = !set
        .groups
        .iter()
        .flat_map(|group| group.files.iter())
        .any(|file| filters.is_source(file));

    set
}
